//! Building blocks of the installation handshake.
//!
//! 1. [`begin_auth`]: authorization URL the merchant is redirected to
//! 2. [`CallbackParams`] + [`hmac::verify_query_signature`]: the signed
//!    callback the platform redirects back with
//! 3. [`exchange_code`]: trade the callback's one-time code for an access
//!    credential
//!
//! [`InstallationNegotiator`](crate::auth::InstallationNegotiator) runs these
//! in order and persists the result.
//!
//! # Security
//!
//! - Every callback parameter is covered by the signature check, and nothing
//!   past the check runs when it fails
//! - Signatures are compared in constant time
//! - The previous API secret is accepted while a key rotation is in flight

mod begin_auth;
mod callback_query;
mod error;
pub mod hmac;
mod token_exchange;

pub use begin_auth::begin_auth;
pub use callback_query::CallbackParams;
pub use error::OAuthError;
pub use token_exchange::{exchange_code, AccessTokenResponse, ACCESS_TOKEN_PATH};
