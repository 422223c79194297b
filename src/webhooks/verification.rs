//! Webhook signature verification.
//!
//! The platform signs every delivery with HMAC-SHA256 over the raw request
//! body, keyed with the app's API secret, and sends the base64 digest in
//! [`HEADER_HMAC`]. Verification must run on the bytes exactly as received;
//! re-serializing a parsed body changes them.
//!
//! # Example
//!
//! ```rust
//! use cart_guardian::webhooks::{verify_webhook, WebhookRequest, WebhookTopic};
//! use cart_guardian::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//! use cart_guardian::auth::oauth::hmac::compute_signature_base64;
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"id":555}"#;
//! let hmac = compute_signature_base64(body, "secret").unwrap();
//! let request = WebhookRequest::new(body.to_vec(), hmac)
//!     .with_topic("checkouts/create")
//!     .with_shop_domain("demo.example");
//!
//! let context = verify_webhook(&config, &request).unwrap();
//! assert_eq!(context.topic(), Some(WebhookTopic::CheckoutsCreate));
//! assert_eq!(context.shop_domain(), Some("demo.example"));
//! ```

use crate::auth::oauth::hmac::verify_body_signature;
use crate::config::AppConfig;

use super::{WebhookError, WebhookTopic};

// ============================================================================
// Header Constants
// ============================================================================

/// Base64 HMAC-SHA256 of the raw body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// Topic string, e.g. `checkouts/create`.
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// Domain of the storefront the delivery concerns.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// API version of the payload format.
pub const HEADER_API_VERSION: &str = "X-Shopify-API-Version";

/// Unique id of the delivery; repeated on retries.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

// ============================================================================
// WebhookRequest
// ============================================================================

/// An incoming webhook delivery: raw body plus the platform's headers.
///
/// The body is kept as bytes so the signature can be checked against exactly
/// what was received.
///
/// ```rust
/// use cart_guardian::webhooks::WebhookRequest;
///
/// let request = WebhookRequest::new(b"raw body bytes".to_vec(), "hmac-signature")
///     .with_webhook_id("webhook-123");
///
/// assert_eq!(request.body(), b"raw body bytes");
/// assert_eq!(request.hmac_header(), "hmac-signature");
/// assert_eq!(request.webhook_id(), Some("webhook-123"));
/// assert_eq!(request.topic(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: String,
    topic: Option<String>,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookRequest {
    /// Creates a request from the raw body and the HMAC header value.
    #[must_use]
    pub fn new(body: Vec<u8>, hmac_header: impl Into<String>) -> Self {
        Self {
            body,
            hmac_header: hmac_header.into(),
            ..Self::default()
        }
    }

    /// Creates a request from the raw body and a case-insensitive header
    /// lookup, as supplied by whatever HTTP framework received it.
    ///
    /// A missing HMAC header becomes an empty string, which never verifies.
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use cart_guardian::webhooks::WebhookRequest;
    ///
    /// let headers: HashMap<String, String> = [
    ///     ("x-shopify-hmac-sha256", "sig"),
    ///     ("x-shopify-shop-domain", "demo.example"),
    /// ]
    /// .into_iter()
    /// .map(|(k, v)| (k.to_string(), v.to_string()))
    /// .collect();
    ///
    /// let request = WebhookRequest::from_headers(b"{}".to_vec(), |name| {
    ///     headers.get(&name.to_ascii_lowercase()).cloned()
    /// });
    /// assert_eq!(request.hmac_header(), "sig");
    /// assert_eq!(request.shop_domain(), Some("demo.example"));
    /// ```
    pub fn from_headers<F>(body: Vec<u8>, header: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            body,
            hmac_header: header(HEADER_HMAC).unwrap_or_default(),
            topic: header(HEADER_TOPIC),
            shop_domain: header(HEADER_SHOP_DOMAIN),
            api_version: header(HEADER_API_VERSION),
            webhook_id: header(HEADER_WEBHOOK_ID),
        }
    }

    /// Sets the topic header.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Sets the shop-domain header.
    #[must_use]
    pub fn with_shop_domain(mut self, shop_domain: impl Into<String>) -> Self {
        self.shop_domain = Some(shop_domain.into());
        self
    }

    /// Sets the API-version header.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Sets the webhook-id header.
    #[must_use]
    pub fn with_webhook_id(mut self, webhook_id: impl Into<String>) -> Self {
        self.webhook_id = Some(webhook_id.into());
        self
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the HMAC header value.
    #[must_use]
    pub fn hmac_header(&self) -> &str {
        &self.hmac_header
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

// ============================================================================
// WebhookContext
// ============================================================================

/// Header metadata of a delivery whose signature verified.
///
/// Only [`verify_webhook`] creates one, so holding a context means the body
/// it came with is authentic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    topic: Option<WebhookTopic>,
    topic_raw: String,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
}

impl WebhookContext {
    /// Returns the parsed topic, or `None` for topics this app does not know.
    #[must_use]
    pub const fn topic(&self) -> Option<WebhookTopic> {
        self.topic
    }

    /// Returns the topic header as received (empty if absent).
    #[must_use]
    pub fn topic_raw(&self) -> &str {
        &self.topic_raw
    }

    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Verifies a delivery's signature and returns its header metadata.
///
/// The primary secret is tried first, then the previous secret if one is
/// configured.
///
/// # Errors
///
/// Returns [`WebhookError::InvalidHmac`] if no configured secret produces the
/// received signature.
pub fn verify_webhook(
    config: &AppConfig,
    request: &WebhookRequest,
) -> Result<WebhookContext, WebhookError> {
    if !verify_body_signature(
        request.body(),
        request.hmac_header(),
        &config.signing_secrets(),
    ) {
        return Err(WebhookError::InvalidHmac);
    }

    let topic_raw = request.topic().unwrap_or_default().to_string();
    let topic = topic_raw.parse().ok();

    Ok(WebhookContext {
        topic,
        topic_raw,
        shop_domain: request.shop_domain().map(String::from),
        api_version: request.api_version().map(String::from),
        webhook_id: request.webhook_id().map(String::from),
    })
}
