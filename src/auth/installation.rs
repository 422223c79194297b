//! The installation handshake, end to end.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::auth::oauth::hmac::verify_query_signature;
use crate::auth::oauth::{begin_auth, exchange_code, CallbackParams, OAuthError};
use crate::clients::{PlatformHttp, TransportError};
use crate::config::{AppConfig, StorefrontId};
use crate::store::{Installation, NewInstallation, ShopStore};
use crate::webhooks::{RegistrationResult, WebhookRegistrar};

/// Result of a successful handshake.
#[derive(Debug)]
pub struct CompletedInstallation {
    /// The stored installation, holding the new credential.
    pub installation: Installation,
    /// One entry per configured webhook subscription. Failures here do not
    /// undo the installation.
    pub registrations: Vec<RegistrationResult>,
}

impl CompletedInstallation {
    /// Returns `true` if every webhook subscription is in place.
    #[must_use]
    pub fn all_webhooks_registered(&self) -> bool {
        self.registrations.iter().all(RegistrationResult::is_success)
    }
}

/// Runs the installation handshake for any number of storefronts.
///
/// Holds no per-request state; one instance serves concurrent callbacks.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use cart_guardian::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
/// use cart_guardian::auth::InstallationNegotiator;
/// use cart_guardian::store::MemoryStore;
///
/// let config = AppConfig::builder()
///     .api_key(ApiKey::new("app-key").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .host(HostUrl::new("https://app.example.com").unwrap())
///     .build()
///     .unwrap();
/// let negotiator = InstallationNegotiator::from_config(config, Arc::new(MemoryStore::new())).unwrap();
///
/// let url = negotiator.authorization_url("demo.example").unwrap();
/// assert!(url.starts_with("https://demo.example/admin/oauth/authorize?client_id=app-key"));
/// ```
#[derive(Clone)]
pub struct InstallationNegotiator {
    config: AppConfig,
    shops: Arc<dyn ShopStore>,
    http: PlatformHttp,
    registrar: WebhookRegistrar,
}

impl std::fmt::Debug for InstallationNegotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallationNegotiator")
            .field("redirect_uri", &self.config.redirect_uri())
            .finish_non_exhaustive()
    }
}

// Verify InstallationNegotiator is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InstallationNegotiator>();
};

impl InstallationNegotiator {
    /// Creates a negotiator from its collaborators.
    #[must_use]
    pub fn new(
        config: AppConfig,
        shops: Arc<dyn ShopStore>,
        http: PlatformHttp,
        registrar: WebhookRegistrar,
    ) -> Self {
        Self {
            config,
            shops,
            http,
            registrar,
        }
    }

    /// Creates a negotiator with its own HTTP client and registrar.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Setup`] if the HTTP client cannot be built.
    pub fn from_config(config: AppConfig, shops: Arc<dyn ShopStore>) -> Result<Self, TransportError> {
        let http = PlatformHttp::new(&config)?;
        let registrar = WebhookRegistrar::new(config.clone(), http.clone());
        Ok(Self::new(config, shops, http, registrar))
    }

    /// Returns the authorization URL for `shop`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidCallback`] if `shop` is not a valid
    /// storefront id.
    pub fn authorization_url(&self, shop: &str) -> Result<String, OAuthError> {
        let shop = parse_shop(shop)?;
        Ok(begin_auth(&self.config, &shop))
    }

    /// Completes an installation from the platform's callback.
    ///
    /// In order: verify the callback signature, exchange the code, upsert the
    /// installation, register webhooks. A failed signature check makes no
    /// network call and writes nothing. Registration failures are logged and
    /// reported in the result; they never fail the handshake.
    ///
    /// # Errors
    ///
    /// - [`OAuthError::InvalidSignature`] for a missing or wrong `hmac`
    /// - [`OAuthError::InvalidCallback`] for a missing `code` or a missing or
    ///   invalid `shop`
    /// - [`OAuthError::UpstreamTimeout`], [`OAuthError::UpstreamCallFailure`],
    ///   [`OAuthError::MalformedTokenResponse`] from the code exchange
    /// - [`OAuthError::Persistence`] if the installation cannot be stored
    pub async fn complete_handshake(
        &self,
        params: &CallbackParams,
    ) -> Result<CompletedInstallation, OAuthError> {
        if !verify_query_signature(params, &self.config.signing_secrets()) {
            warn!(
                shop = params.get("shop").unwrap_or_default(),
                "Rejected installation callback with invalid signature"
            );
            return Err(OAuthError::InvalidSignature);
        }

        let code = params
            .get("code")
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OAuthError::InvalidCallback {
                reason: "missing code parameter".to_string(),
            })?;
        let shop = parse_shop(params.get("shop").unwrap_or_default())?;

        let token = exchange_code(&self.http, &self.config, &shop, code)
            .await
            .map_err(|e| {
                error!(shop = %shop, error = %e, "Authorization code exchange failed");
                e
            })?;

        let installation = self
            .shops
            .upsert(NewInstallation::now(
                shop.clone(),
                token.access_token,
                token.scope,
            ))
            .map_err(|e| {
                error!(shop = %shop, error = %e, "Failed to store installation");
                OAuthError::from(e)
            })?;

        info!(
            shop = %shop,
            installation_id = installation.id,
            scope = %installation.scope,
            "App installed"
        );

        let registrations = self
            .registrar
            .register_all(&shop, &installation.access_token)
            .await;

        Ok(CompletedInstallation {
            installation,
            registrations,
        })
    }
}

fn parse_shop(raw: &str) -> Result<StorefrontId, OAuthError> {
    StorefrontId::new(raw).map_err(|_| OAuthError::InvalidCallback {
        reason: format!("invalid shop: '{raw}'"),
    })
}
