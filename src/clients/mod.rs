//! HTTP access to the platform's admin endpoints.
//!
//! Both outbound calls this crate makes (the token exchange and webhook
//! registration) are JSON POSTs to `https://{shop}/admin/...`. They share one
//! [`PlatformHttp`], which owns:
//!
//! - a single `reqwest::Client` with the configured request timeout
//! - the `User-Agent` header
//! - base URL resolution (`https://{shop}`, or the configured
//!   `platform_base_url` when calls are routed through a proxy or a mock)
//!
//! Transport failures are reduced to [`TransportError`] so callers can tell a
//! timeout from any other network failure.

mod errors;

pub use errors::TransportError;

use serde::Serialize;

use crate::config::{AccessToken, AppConfig, StorefrontId};

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying the access credential on authenticated admin calls.
pub const HEADER_ACCESS_TOKEN: &str = "X-Shopify-Access-Token";

/// Header carrying the platform's request id.
pub const HEADER_REQUEST_ID: &str = "X-Request-Id";

/// A response from an admin endpoint, status and body as received.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
    /// Value of the `X-Request-Id` header, if present.
    pub request_id: Option<String>,
}

impl PlatformResponse {
    /// Returns `true` for 2xx responses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Shared client for calls to the platform.
#[derive(Clone, Debug)]
pub struct PlatformHttp {
    client: reqwest::Client,
    base_url: Option<String>,
}

// Verify PlatformHttp is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<PlatformHttp>();
};

impl PlatformHttp {
    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Setup`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &AppConfig) -> Result<Self, TransportError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let user_agent = format!("{user_agent_prefix}Cart Guardian v{SDK_VERSION}");

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.request_timeout())
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.platform_base_url().map(|url| url.as_ref().to_string()),
        })
    }

    /// Returns the absolute URL of an admin `path` on `shop`.
    ///
    /// ```rust
    /// use cart_guardian::{AppConfig, ApiKey, ApiSecretKey, HostUrl, StorefrontId};
    /// use cart_guardian::clients::PlatformHttp;
    ///
    /// let config = AppConfig::builder()
    ///     .api_key(ApiKey::new("key").unwrap())
    ///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
    ///     .host(HostUrl::new("https://app.example.com").unwrap())
    ///     .build()
    ///     .unwrap();
    /// let http = PlatformHttp::new(&config).unwrap();
    /// let shop = StorefrontId::new("demo.example").unwrap();
    ///
    /// assert_eq!(
    ///     http.admin_url(&shop, "/admin/oauth/access_token"),
    ///     "https://demo.example/admin/oauth/access_token"
    /// );
    /// ```
    #[must_use]
    pub fn admin_url(&self, shop: &StorefrontId, path: &str) -> String {
        self.base_url.as_ref().map_or_else(
            || format!("https://{}{path}", shop.as_ref()),
            |base| format!("{base}{path}"),
        )
    }

    /// POSTs a JSON body and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if no complete response was received.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        access_token: Option<&AccessToken>,
    ) -> Result<PlatformResponse, TransportError> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body);
        if let Some(token) = access_token {
            request = request.header(HEADER_ACCESS_TOKEN, token.as_ref());
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get(HEADER_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response.text().await?;

        Ok(PlatformResponse {
            status,
            body,
            request_id,
        })
    }
}
