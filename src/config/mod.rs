//! Application configuration.
//!
//! All credentials and externally visible URLs are injected through
//! [`AppConfig`]; nothing is read from process-wide state after construction.
//!
//! - [`AppConfig`]: immutable settings shared by every component
//! - [`AppConfigBuilder`]: fluent construction with validation
//! - [`ApiKey`], [`ApiSecretKey`], [`AccessToken`], [`StorefrontId`],
//!   [`HostUrl`]: validated newtypes
//! - [`ApiVersion`]: Admin API version for the registration endpoint
//!
//! # Example
//!
//! ```rust
//! use cart_guardian::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.redirect_uri(), "https://app.example.com/shopify/callback");
//! ```
//!
//! # Environment Variables
//!
//! [`AppConfig::from_env`] reads:
//!
//! - `SHOPIFY_API_KEY` (required)
//! - `SHOPIFY_API_SECRET` (required)
//! - `APP_HOST_URL` (required) - public URL the platform redirects and delivers to
//! - `SHOPIFY_OLD_API_SECRET` - previous secret, accepted during key rotation
//! - `SHOPIFY_SCOPES` - comma-separated scope list
//! - `SHOPIFY_API_VERSION` - e.g. `2024-07`
//! - `SHOPIFY_REQUEST_TIMEOUT_SECS` - timeout for calls to the platform
//! - `SHOPIFY_PLATFORM_BASE_URL` - replaces `https://{shop}` for admin calls
//! - `WEBHOOK_ENFORCE_INSTALLED_SHOPS` - `true` to reject deliveries from
//!   storefronts without an active installation

mod newtypes;
mod version;

pub use newtypes::{AccessToken, ApiKey, ApiSecretKey, HostUrl, StorefrontId};
pub use version::ApiVersion;

use std::time::Duration;

use crate::error::ConfigError;
use crate::webhooks::WebhookTopic;

/// Scopes requested when no override is configured.
pub const DEFAULT_SCOPES: &[&str] = &[
    "read_checkouts",
    "read_orders",
    "write_checkouts",
    "write_orders",
];

/// Path on this application that receives the installation callback.
pub const DEFAULT_CALLBACK_PATH: &str = "/shopify/callback";

/// Path on this application that receives `checkouts/create` deliveries.
pub const DEFAULT_CHECKOUT_WEBHOOK_PATH: &str = "/webhooks/checkouts/create";

/// Timeout applied to every call to the platform.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A webhook topic paired with the path on this application that receives it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookSubscription {
    /// The topic to subscribe to.
    pub topic: WebhookTopic,
    /// Path appended to the host URL to form the delivery address.
    pub path: String,
}

impl WebhookSubscription {
    /// Creates a subscription for `topic` delivered to `path`.
    #[must_use]
    pub fn new(topic: WebhookTopic, path: impl Into<String>) -> Self {
        Self {
            topic,
            path: path.into(),
        }
    }
}

/// Configuration shared by the installation and webhook components.
///
/// `Clone`, `Send` and `Sync`; components hold their own copy.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    host: HostUrl,
    scopes: Vec<String>,
    api_version: ApiVersion,
    callback_path: String,
    webhook_subscriptions: Vec<WebhookSubscription>,
    request_timeout: Duration,
    user_agent_prefix: Option<String>,
    platform_base_url: Option<HostUrl>,
    enforce_installed_shops: bool,
}

impl AppConfig {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::new()
    }

    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when a required variable is
    /// unset and [`ConfigError::InvalidEnvVar`] (or a newtype validation
    /// error) when a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingEnvVar { name });

        let mut builder = Self::builder()
            .api_key(ApiKey::new(require("SHOPIFY_API_KEY")?)?)
            .api_secret_key(ApiSecretKey::new(require("SHOPIFY_API_SECRET")?)?)
            .host(HostUrl::new(require("APP_HOST_URL")?)?);

        if let Some(old) = get("SHOPIFY_OLD_API_SECRET") {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(scopes) = get("SHOPIFY_SCOPES") {
            builder = builder.scopes(scopes.split(','));
        }
        if let Some(version) = get("SHOPIFY_API_VERSION") {
            builder = builder.api_version(version.parse()?);
        }
        if let Some(secs) = get("SHOPIFY_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| ConfigError::InvalidEnvVar {
                name: "SHOPIFY_REQUEST_TIMEOUT_SECS",
                reason: format!("{e}"),
            })?;
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(base) = get("SHOPIFY_PLATFORM_BASE_URL") {
            builder = builder.platform_base_url(HostUrl::new(base)?);
        }
        if let Some(flag) = get("WEBHOOK_ENFORCE_INSTALLED_SHOPS") {
            let flag = match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(ConfigError::InvalidEnvVar {
                        name: "WEBHOOK_ENFORCE_INSTALLED_SHOPS",
                        reason: format!("expected a boolean, got '{other}'"),
                    })
                }
            };
            builder = builder.enforce_installed_shops(flag);
        }

        builder.build()
    }

    /// Returns the API key (OAuth client id).
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key (OAuth client secret and signing key).
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the previous secret key, if one is still accepted.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns every secret accepted for signature checks, primary first.
    #[must_use]
    pub fn signing_secrets(&self) -> Vec<&str> {
        std::iter::once(self.api_secret_key.as_ref())
            .chain(self.old_api_secret_key.as_ref().map(AsRef::as_ref))
            .collect()
    }

    /// Returns this application's public URL.
    #[must_use]
    pub const fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Returns the requested OAuth scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Returns the Admin API version.
    #[must_use]
    pub const fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Returns the full redirect URI registered for the installation callback.
    #[must_use]
    pub fn redirect_uri(&self) -> String {
        self.host.join(&self.callback_path)
    }

    /// Returns the webhook subscriptions created after each installation.
    #[must_use]
    pub fn webhook_subscriptions(&self) -> &[WebhookSubscription] {
        &self.webhook_subscriptions
    }

    /// Returns the public delivery address for a subscription.
    #[must_use]
    pub fn webhook_address(&self, subscription: &WebhookSubscription) -> String {
        self.host.join(&subscription.path)
    }

    /// Returns the timeout applied to calls to the platform.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns the base URL that replaces `https://{shop}` for admin calls.
    #[must_use]
    pub const fn platform_base_url(&self) -> Option<&HostUrl> {
        self.platform_base_url.as_ref()
    }

    /// Returns whether webhook deliveries require an active installation.
    #[must_use]
    pub const fn enforce_installed_shops(&self) -> bool {
        self.enforce_installed_shops
    }
}

// Verify AppConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<AppConfig>();
};

/// Builder for [`AppConfig`].
///
/// `api_key`, `api_secret_key` and `host` are required.
///
/// # Defaults
///
/// - `scopes`: [`DEFAULT_SCOPES`]
/// - `api_version`: `2024-07`
/// - `callback_path`: [`DEFAULT_CALLBACK_PATH`]
/// - `webhook_subscriptions`: `checkouts/create` at [`DEFAULT_CHECKOUT_WEBHOOK_PATH`]
/// - `request_timeout`: [`DEFAULT_REQUEST_TIMEOUT`]
/// - `enforce_installed_shops`: `false`
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    host: Option<HostUrl>,
    scopes: Option<Vec<String>>,
    api_version: Option<ApiVersion>,
    callback_path: Option<String>,
    webhook_subscriptions: Option<Vec<WebhookSubscription>>,
    request_timeout: Option<Duration>,
    user_agent_prefix: Option<String>,
    platform_base_url: Option<HostUrl>,
    enforce_installed_shops: bool,
}

impl AppConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets a previous secret key that is still accepted while a rotation is
    /// in flight. Signatures are checked against the primary key first.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets this application's public URL (required).
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the requested scopes. Entries are trimmed and blanks dropped.
    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scopes = Some(
            scopes
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        );
        self
    }

    /// Sets the Admin API version.
    #[must_use]
    pub const fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Sets the callback path appended to the host URL.
    #[must_use]
    pub fn callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = Some(path.into());
        self
    }

    /// Replaces the webhook subscriptions registered after installation.
    #[must_use]
    pub fn webhook_subscriptions(mut self, subscriptions: Vec<WebhookSubscription>) -> Self {
        self.webhook_subscriptions = Some(subscriptions);
        self
    }

    /// Sets the timeout for calls to the platform.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the user agent prefix for calls to the platform.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Routes admin calls to `base` instead of `https://{shop}` (proxies,
    /// local mocks).
    #[must_use]
    pub fn platform_base_url(mut self, base: HostUrl) -> Self {
        self.platform_base_url = Some(base);
        self
    }

    /// Rejects webhook deliveries from storefronts without an active
    /// installation.
    #[must_use]
    pub const fn enforce_installed_shops(mut self, enforce: bool) -> Self {
        self.enforce_installed_shops = enforce;
        self
    }

    /// Builds the [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key`,
    /// `api_secret_key` or `host` is not set.
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;
        let host = self
            .host
            .ok_or(ConfigError::MissingRequiredField { field: "host" })?;

        Ok(AppConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            host,
            scopes: self
                .scopes
                .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(ToString::to_string).collect()),
            api_version: self.api_version.unwrap_or_default(),
            callback_path: self
                .callback_path
                .unwrap_or_else(|| DEFAULT_CALLBACK_PATH.to_string()),
            webhook_subscriptions: self.webhook_subscriptions.unwrap_or_else(|| {
                vec![WebhookSubscription::new(
                    WebhookTopic::CheckoutsCreate,
                    DEFAULT_CHECKOUT_WEBHOOK_PATH,
                )]
            }),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            user_agent_prefix: self.user_agent_prefix,
            platform_base_url: self.platform_base_url,
            enforce_installed_shops: self.enforce_installed_shops,
        })
    }
}
