//! Abandoned-checkout ingestion.
//!
//! Each delivery moves through verify, parse, filter, and store. Any step can
//! end it early, and every ending maps to one HTTP status so the routing
//! layer can answer immediately:
//!
//! | Outcome                     | Status |
//! |-----------------------------|--------|
//! | [`IngestOutcome::Stored`]    | 200    |
//! | [`IngestOutcome::Duplicate`] | 200    |
//! | [`IngestOutcome::Skipped`]   | 200    |
//! | [`IngestOutcome::Rejected`]  | 401    |
//! | [`IngestOutcome::Failed`]    | 500    |
//!
//! The platform retries anything other than a 2xx, so a duplicate answers
//! 200 and a delivery this app will never act on (no email, or a topic that
//! does not carry a checkout) does too.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, StorefrontId};
use crate::store::{
    AbandonedCheckout, CheckoutStore, InsertOutcome, NewAbandonedCheckout, ShopStore,
    MAX_RECOVERY_URL_LEN,
};

use super::{
    verify_webhook, CheckoutPayload, WebhookContext, WebhookError, WebhookRequest, WebhookTopic,
};

/// Why a verified delivery was acknowledged without storing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The checkout has no customer email to recover.
    MissingEmail,
    /// The topic header names something other than a checkout event.
    UnsupportedTopic,
}

/// How one delivery ended.
#[derive(Debug)]
pub enum IngestOutcome {
    /// A new record was written.
    Stored(AbandonedCheckout),
    /// A record for this checkout already existed.
    Duplicate {
        checkout_id: String,
    },
    /// The delivery was valid but not worth storing.
    /// `checkout_id` is `None` when the payload was never parsed.
    Skipped {
        checkout_id: Option<String>,
        reason: SkipReason,
    },
    /// The delivery was not accepted as authentic. Nothing was parsed or stored.
    Rejected(WebhookError),
    /// The delivery was authentic but could not be processed.
    Failed(WebhookError),
}

impl IngestOutcome {
    /// Returns the HTTP status to answer the delivery with.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Stored(_) | Self::Duplicate { .. } | Self::Skipped { .. } => 200,
            Self::Rejected(_) => 401,
            Self::Failed(_) => 500,
        }
    }

    /// Returns a short plain-text response body. Never includes error details.
    #[must_use]
    pub const fn response_body(&self) -> &'static str {
        match self {
            Self::Stored(_) | Self::Duplicate { .. } | Self::Skipped { .. } => {
                "Webhook received and processed."
            }
            Self::Rejected(_) => "Invalid HMAC.",
            Self::Failed(_) => "Processing error.",
        }
    }

    /// Returns `true` for outcomes the platform should not retry.
    #[must_use]
    pub const fn is_acknowledged(&self) -> bool {
        self.status_code() == 200
    }
}

/// Turns signed checkout deliveries into [`AbandonedCheckout`] records.
///
/// Holds no mutable state; one instance can serve concurrent deliveries.
#[derive(Clone)]
pub struct WebhookIngestor {
    config: AppConfig,
    shops: Arc<dyn ShopStore>,
    checkouts: Arc<dyn CheckoutStore>,
}

impl std::fmt::Debug for WebhookIngestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookIngestor")
            .field("enforce_installed_shops", &self.config.enforce_installed_shops())
            .finish_non_exhaustive()
    }
}

// Verify WebhookIngestor is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookIngestor>();
};

impl WebhookIngestor {
    /// Creates an ingestor.
    ///
    /// `shops` is only read, and only when
    /// [`AppConfig::enforce_installed_shops`] is set.
    #[must_use]
    pub fn new(
        config: AppConfig,
        shops: Arc<dyn ShopStore>,
        checkouts: Arc<dyn CheckoutStore>,
    ) -> Self {
        Self {
            config,
            shops,
            checkouts,
        }
    }

    /// Processes one delivery.
    pub fn ingest(&self, request: &WebhookRequest) -> IngestOutcome {
        let context = match verify_webhook(&self.config, request) {
            Ok(context) => context,
            Err(e) => {
                warn!(
                    shop = request.shop_domain().unwrap_or_default(),
                    webhook_id = request.webhook_id().unwrap_or_default(),
                    "Rejected webhook with invalid signature"
                );
                return IngestOutcome::Rejected(e);
            }
        };

        if self.config.enforce_installed_shops() {
            if let Err(e) = self.require_installed(&context) {
                return match e {
                    WebhookError::ShopNotInstalled { .. } => {
                        warn!(
                            shop = context.shop_domain().unwrap_or_default(),
                            "Rejected webhook from shop without an active installation"
                        );
                        IngestOutcome::Rejected(e)
                    }
                    other => {
                        error!(error = %other, "Installation lookup failed");
                        IngestOutcome::Failed(other)
                    }
                };
            }
        }

        let checkout_topic = context.topic().is_some_and(WebhookTopic::is_checkout);
        if !context.topic_raw().is_empty() && !checkout_topic {
            debug!(
                shop = context.shop_domain().unwrap_or_default(),
                topic = context.topic_raw(),
                "Skipping webhook with non-checkout topic"
            );
            return IngestOutcome::Skipped {
                checkout_id: None,
                reason: SkipReason::UnsupportedTopic,
            };
        }

        let payload = match parse_payload(request.body()) {
            Ok(payload) => payload,
            Err(e) => {
                error!(
                    shop = context.shop_domain().unwrap_or_default(),
                    topic = context.topic_raw(),
                    error = %e,
                    "Could not parse webhook payload"
                );
                return IngestOutcome::Failed(e);
            }
        };
        let checkout_id = payload.id.to_string();

        let Some(email) = payload.contact_email() else {
            debug!(checkout_id = %checkout_id, "Skipping checkout without customer email");
            return IngestOutcome::Skipped {
                checkout_id: Some(checkout_id),
                reason: SkipReason::MissingEmail,
            };
        };

        let record = NewAbandonedCheckout::pending(
            checkout_id.clone(),
            context.shop_domain().map(String::from),
            Some(email.to_string()),
            payload.abandoned_checkout_url.clone(),
        );

        match self.checkouts.insert_if_absent(record) {
            Ok(InsertOutcome::Inserted(stored)) => {
                info!(
                    checkout_id = %stored.checkout_id,
                    shop = stored.shop_domain.as_deref().unwrap_or_default(),
                    "Stored abandoned checkout"
                );
                IngestOutcome::Stored(stored)
            }
            Ok(InsertOutcome::Duplicate) => {
                debug!(checkout_id = %checkout_id, "Ignoring duplicate checkout delivery");
                IngestOutcome::Duplicate { checkout_id }
            }
            Err(e) => {
                error!(checkout_id = %checkout_id, error = %e, "Failed to store abandoned checkout");
                IngestOutcome::Failed(e.into())
            }
        }
    }

    fn require_installed(&self, context: &WebhookContext) -> Result<(), WebhookError> {
        let raw = context.shop_domain().unwrap_or_default();
        let not_installed = || WebhookError::ShopNotInstalled {
            shop: raw.to_string(),
        };

        let shop = StorefrontId::new(raw).map_err(|_| not_installed())?;
        match self.shops.find_by_shop(&shop)? {
            Some(installation) if installation.active => Ok(()),
            _ => Err(not_installed()),
        }
    }
}

fn parse_payload(body: &[u8]) -> Result<CheckoutPayload, WebhookError> {
    let payload: CheckoutPayload =
        serde_json::from_slice(body).map_err(|e| WebhookError::MalformedPayload {
            reason: e.to_string(),
        })?;

    if payload.id.to_string().trim().is_empty() {
        return Err(WebhookError::MalformedPayload {
            reason: "checkout id is empty".to_string(),
        });
    }
    if payload
        .abandoned_checkout_url
        .as_ref()
        .is_some_and(|url| url.len() > MAX_RECOVERY_URL_LEN)
    {
        return Err(WebhookError::MalformedPayload {
            reason: format!("abandoned_checkout_url exceeds {MAX_RECOVERY_URL_LEN} bytes"),
        });
    }

    Ok(payload)
}
