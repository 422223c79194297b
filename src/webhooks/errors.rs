//! Webhook error types.
//!
//! - [`WebhookError::InvalidHmac`]: delivery signature did not verify
//! - [`WebhookError::ShopNotInstalled`]: delivery from a storefront with no
//!   active installation (only when enforcement is enabled)
//! - [`WebhookError::MalformedPayload`]: verified body could not be used
//! - [`WebhookError::RegistrationFailed`]: registration endpoint answered 4xx/5xx
//! - [`WebhookError::Timeout`], [`WebhookError::Transport`]: registration call
//!   produced no response
//! - [`WebhookError::Persistence`]: a store operation failed
//!
//! # Example
//!
//! ```rust
//! use cart_guardian::webhooks::WebhookError;
//!
//! let error = WebhookError::RegistrationFailed {
//!     status: 403,
//!     message: "Forbidden".to_string(),
//! };
//! assert!(error.to_string().contains("403"));
//! ```

use thiserror::Error;

use crate::clients::TransportError;
use crate::store::StoreError;

/// Error type for webhook verification, ingestion, and registration.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    ///
    /// The message is intentionally generic to avoid leaking security details.
    #[error("Webhook signature verification failed")]
    InvalidHmac,

    /// The delivery's storefront has no active installation.
    #[error("No active installation for shop: {shop}")]
    ShopNotInstalled {
        /// The shop-domain header value, or empty if absent.
        shop: String,
    },

    /// The verified body is not a usable checkout payload.
    #[error("Malformed webhook payload: {reason}")]
    MalformedPayload {
        /// What was wrong with the payload.
        reason: String,
    },

    /// The registration endpoint rejected the subscription.
    #[error("Webhook registration failed with status {status}: {message}")]
    RegistrationFailed {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The registration call did not complete within the configured timeout.
    #[error("Webhook registration timed out")]
    Timeout,

    /// The registration call could not be made.
    #[error("Webhook registration transport error: {0}")]
    Transport(String),

    /// A store operation failed.
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl From<TransportError> for WebhookError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => Self::Timeout,
            TransportError::Network(message) | TransportError::Setup(message) => {
                Self::Transport(message)
            }
        }
    }
}

// Verify WebhookError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookError>();
};
