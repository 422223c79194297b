//! Transport-level errors for calls to the platform.

use thiserror::Error;

/// A call to the platform produced no usable HTTP response.
///
/// Non-2xx responses are not transport errors; callers inspect
/// [`PlatformResponse::status`](super::PlatformResponse::status) themselves.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout.
    #[error("Request to the platform timed out")]
    Timeout,

    /// Connection, TLS, or body-read failure.
    #[error("Network error: {0}")]
    Network(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Setup(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(error.to_string())
        }
    }
}
