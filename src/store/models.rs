//! Records kept by the stores.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::config::{AccessToken, StorefrontId};

/// Longest accepted recovery URL, in bytes.
pub const MAX_RECOVERY_URL_LEN: usize = 1024;

/// A storefront's installation of this app.
///
/// At most one exists per storefront. `access_token` cannot be empty, so an
/// active installation always holds a usable credential.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Installation {
    /// Store-assigned id, stable across upserts.
    pub id: i64,
    /// The storefront this installation belongs to.
    pub shop: StorefrontId,
    /// Long-lived credential for admin calls.
    pub access_token: AccessToken,
    /// Scope string granted by the token endpoint.
    pub scope: String,
    /// Whether the installation is current.
    pub active: bool,
    /// When the most recent handshake completed.
    pub installed_at: DateTime<Utc>,
}

/// Input to [`ShopStore::upsert`](super::ShopStore::upsert).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInstallation {
    pub shop: StorefrontId,
    pub access_token: AccessToken,
    pub scope: String,
    pub installed_at: DateTime<Utc>,
}

impl NewInstallation {
    /// Creates an installation completed now.
    #[must_use]
    pub fn now(shop: StorefrontId, access_token: AccessToken, scope: impl Into<String>) -> Self {
        Self {
            shop,
            access_token,
            scope: scope.into(),
            installed_at: Utc::now(),
        }
    }
}

/// Recovery progress of an abandoned checkout.
///
/// Ingestion only produces [`CheckoutStatus::Pending`]; the other states
/// belong to the recovery workflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CheckoutStatus {
    #[default]
    Pending,
    Sent,
    Recovered,
}

impl CheckoutStatus {
    /// Returns the stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
            Self::Recovered => "RECOVERED",
        }
    }
}

impl fmt::Display for CheckoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckoutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SENT" => Ok(Self::Sent),
            "RECOVERED" => Ok(Self::Recovered),
            other => Err(format!("unknown checkout status '{other}'")),
        }
    }
}

/// A checkout the customer left without paying.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbandonedCheckout {
    /// Store-assigned id.
    pub id: i64,
    /// The platform's checkout id in string form. Unique.
    pub checkout_id: String,
    /// Storefront that sent the delivery, when the header was present.
    pub shop_domain: Option<String>,
    pub customer_email: Option<String>,
    /// Link that resumes the checkout. At most [`MAX_RECOVERY_URL_LEN`] bytes.
    pub recovery_url: Option<String>,
    pub status: CheckoutStatus,
    pub created_at: DateTime<Utc>,
}

/// Input to [`CheckoutStore::insert_if_absent`](super::CheckoutStore::insert_if_absent).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAbandonedCheckout {
    pub checkout_id: String,
    pub shop_domain: Option<String>,
    pub customer_email: Option<String>,
    pub recovery_url: Option<String>,
    pub status: CheckoutStatus,
    pub created_at: DateTime<Utc>,
}

impl NewAbandonedCheckout {
    /// Creates a [`CheckoutStatus::Pending`] record timestamped now.
    #[must_use]
    pub fn pending(
        checkout_id: impl Into<String>,
        shop_domain: Option<String>,
        customer_email: Option<String>,
        recovery_url: Option<String>,
    ) -> Self {
        Self {
            checkout_id: checkout_id.into(),
            shop_domain,
            customer_email,
            recovery_url,
            status: CheckoutStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if the recovery URL fits the stored column.
    #[must_use]
    pub fn recovery_url_fits(&self) -> bool {
        self.recovery_url
            .as_ref()
            .map_or(true, |url| url.len() <= MAX_RECOVERY_URL_LEN)
    }

    pub(crate) fn into_record(self, id: i64) -> AbandonedCheckout {
        AbandonedCheckout {
            id,
            checkout_id: self.checkout_id,
            shop_domain: self.shop_domain,
            customer_email: self.customer_email,
            recovery_url: self.recovery_url,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_status_string_forms() {
        for status in [
            CheckoutStatus::Pending,
            CheckoutStatus::Sent,
            CheckoutStatus::Recovered,
        ] {
            assert_eq!(status.as_str().parse::<CheckoutStatus>().unwrap(), status);
        }
        assert!("abandoned".parse::<CheckoutStatus>().is_err());
        assert!("pending".parse::<CheckoutStatus>().is_err());
        assert_eq!(CheckoutStatus::default(), CheckoutStatus::Pending);
        assert_eq!(CheckoutStatus::Recovered.to_string(), "RECOVERED");
    }

    #[test]
    fn test_pending_record_defaults() {
        let record = NewAbandonedCheckout::pending("555", None, Some("a@b.com".into()), None);
        assert_eq!(record.status, CheckoutStatus::Pending);
        assert_eq!(record.checkout_id, "555");
        assert!(record.recovery_url_fits());
    }

    #[test]
    fn test_recovery_url_length_limit() {
        let at_limit = "a".repeat(MAX_RECOVERY_URL_LEN);
        let record = NewAbandonedCheckout::pending("1", None, None, Some(at_limit));
        assert!(record.recovery_url_fits());

        let over = "a".repeat(MAX_RECOVERY_URL_LEN + 1);
        let record = NewAbandonedCheckout::pending("1", None, None, Some(over));
        assert!(!record.recovery_url_fits());
    }

    #[test]
    fn test_installation_debug_masks_token() {
        let installation = NewInstallation::now(
            StorefrontId::new("demo.example").unwrap(),
            AccessToken::new("tok_secret").unwrap(),
            "read_orders",
        );
        let debug = format!("{installation:?}");
        assert!(!debug.contains("tok_secret"));
        assert!(debug.contains("demo.example"));
    }
}
