//! Errors for the installation handshake.
//!
//! - [`OAuthError::InvalidSignature`]: callback signature did not verify
//! - [`OAuthError::InvalidCallback`]: required parameters missing or malformed
//! - [`OAuthError::UpstreamTimeout`]: token endpoint did not answer in time
//! - [`OAuthError::UpstreamCallFailure`]: network error or non-2xx from the token endpoint
//! - [`OAuthError::MalformedTokenResponse`]: token endpoint answered with an unexpected body
//! - [`OAuthError::Persistence`]: the installation could not be saved
//!
//! ```rust
//! use cart_guardian::auth::oauth::OAuthError;
//!
//! let error = OAuthError::InvalidSignature;
//! assert_eq!(error.to_string(), "HMAC signature validation failed");
//! assert!(!error.is_retryable());
//! ```

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while installing the app on a storefront.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The callback's `hmac` parameter is missing or does not match.
    ///
    /// Nothing past signature verification runs when this is returned.
    #[error("HMAC signature validation failed")]
    InvalidSignature,

    /// Callback parameters are missing or malformed.
    #[error("Invalid callback: {reason}")]
    InvalidCallback {
        /// Description of what is wrong with the callback.
        reason: String,
    },

    /// The token endpoint did not respond within the configured timeout.
    #[error("Token exchange timed out")]
    UpstreamTimeout,

    /// The token endpoint could not be reached or answered with a non-2xx status.
    #[error("Token exchange failed{}: {message}", status_suffix(.status))]
    UpstreamCallFailure {
        /// HTTP status, if a response was received.
        status: Option<u16>,
        /// Response body or transport error description.
        message: String,
    },

    /// The token endpoint answered 2xx with a body that has no usable token.
    #[error("Malformed token response: {reason}")]
    MalformedTokenResponse {
        /// What was wrong with the response.
        reason: String,
    },

    /// The installation record could not be written.
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

impl OAuthError {
    /// Returns `true` when retrying the same installation can succeed.
    ///
    /// Upstream and persistence failures are transient; signature, callback
    /// and response-shape failures are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UpstreamTimeout | Self::UpstreamCallFailure { .. } | Self::Persistence(_)
        )
    }

    /// Returns the message shown to the merchant on a failed installation.
    ///
    /// Deliberately free of internal details.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidSignature | Self::InvalidCallback { .. } => {
                "Security check failed: this installation request could not be verified."
            }
            Self::UpstreamTimeout
            | Self::UpstreamCallFailure { .. }
            | Self::Persistence(_) => {
                "The app could not be installed right now. Please try again in a few minutes."
            }
            Self::MalformedTokenResponse { .. } => {
                "The app could not be installed. Please contact support if this keeps happening."
            }
        }
    }
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_failure_includes_status_when_present() {
        let error = OAuthError::UpstreamCallFailure {
            status: Some(401),
            message: "Invalid client credentials".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Token exchange failed with status 401: Invalid client credentials"
        );

        let error = OAuthError::UpstreamCallFailure {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(error.to_string(), "Token exchange failed: connection refused");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(OAuthError::UpstreamTimeout.is_retryable());
        assert!(OAuthError::Persistence(StoreError::Unavailable("down".to_string())).is_retryable());
        assert!(!OAuthError::InvalidSignature.is_retryable());
        assert!(!OAuthError::MalformedTokenResponse {
            reason: "missing access_token".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_user_message_hides_details() {
        let error = OAuthError::UpstreamCallFailure {
            status: Some(500),
            message: "stack trace with secrets".to_string(),
        };
        assert!(!error.user_message().contains("secrets"));
        assert!(OAuthError::InvalidSignature
            .user_message()
            .contains("could not be verified"));
    }

    #[test]
    fn test_persistence_error_converts() {
        let error: OAuthError = StoreError::Unavailable("locked".to_string()).into();
        assert!(matches!(error, OAuthError::Persistence(_)));
    }
}
