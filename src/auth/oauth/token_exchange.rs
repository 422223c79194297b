//! Authorization-code exchange.
//!
//! The one-time `code` from the installation callback is traded for a
//! long-lived access credential:
//!
//! ```text
//! POST {base}/admin/oauth/access_token
//! {"client_id": "..", "client_secret": "..", "code": ".."}
//!
//! 200 {"access_token": "..", "scope": "read_orders,..."}
//! ```

use serde::{Deserialize, Serialize};

use crate::auth::oauth::OAuthError;
use crate::clients::{PlatformHttp, TransportError};
use crate::config::{AccessToken, AppConfig, StorefrontId};

/// Path of the token endpoint on every storefront.
pub const ACCESS_TOKEN_PATH: &str = "/admin/oauth/access_token";

#[derive(Serialize)]
struct CodeExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct RawTokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// A successful token endpoint answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessTokenResponse {
    /// The long-lived credential. Never empty.
    pub access_token: AccessToken,
    /// Scopes actually granted, comma-separated. Empty if not reported.
    pub scope: String,
}

impl AccessTokenResponse {
    /// Parses a token endpoint body.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::MalformedTokenResponse`] for invalid JSON or a
    /// missing or empty `access_token`.
    pub fn parse(body: &str) -> Result<Self, OAuthError> {
        let raw: RawTokenResponse =
            serde_json::from_str(body).map_err(|e| OAuthError::MalformedTokenResponse {
                reason: format!("invalid JSON: {e}"),
            })?;

        let access_token = raw
            .access_token
            .ok_or_else(|| OAuthError::MalformedTokenResponse {
                reason: "missing access_token".to_string(),
            })
            .and_then(|token| {
                AccessToken::new(token).map_err(|_| OAuthError::MalformedTokenResponse {
                    reason: "empty access_token".to_string(),
                })
            })?;

        Ok(Self {
            access_token,
            scope: raw.scope.unwrap_or_default(),
        })
    }
}

/// Exchanges an authorization code for an access credential.
///
/// # Errors
///
/// - [`OAuthError::UpstreamTimeout`] if the endpoint did not answer in time
/// - [`OAuthError::UpstreamCallFailure`] for network errors (`status: None`)
///   and non-2xx answers (`status: Some(..)`)
/// - [`OAuthError::MalformedTokenResponse`] if a 2xx body has no usable token
pub async fn exchange_code(
    http: &PlatformHttp,
    config: &AppConfig,
    shop: &StorefrontId,
    code: &str,
) -> Result<AccessTokenResponse, OAuthError> {
    let request_body = CodeExchangeRequest {
        client_id: config.api_key().as_ref(),
        client_secret: config.api_secret_key().as_ref(),
        code,
    };

    let response = http
        .post_json(&http.admin_url(shop, ACCESS_TOKEN_PATH), &request_body, None)
        .await
        .map_err(|e| match e {
            TransportError::Timeout => OAuthError::UpstreamTimeout,
            other => OAuthError::UpstreamCallFailure {
                status: None,
                message: other.to_string(),
            },
        })?;

    if !response.is_success() {
        return Err(OAuthError::UpstreamCallFailure {
            status: Some(response.status),
            message: response.body,
        });
    }

    AccessTokenResponse::parse(&response.body)
}
