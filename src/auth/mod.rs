//! App installation.
//!
//! - [`InstallationNegotiator`]: authorization URL and callback completion,
//!   persisting one [`Installation`](crate::store::Installation) per storefront
//! - [`oauth`]: the individual handshake steps and their error type
//!
//! # Flow
//!
//! ```rust,ignore
//! use cart_guardian::auth::oauth::CallbackParams;
//!
//! // GET /shopify/install?shop=demo.example
//! let url = negotiator.authorization_url(&shop)?;
//! // redirect the browser to `url`
//!
//! // GET /shopify/callback?code=..&shop=..&timestamp=..&hmac=..
//! let params = CallbackParams::from_query_string(raw_query);
//! match negotiator.complete_handshake(&params).await {
//!     Ok(done) => { /* installed; done.registrations lists webhook results */ }
//!     Err(e) => { /* show e.user_message() */ }
//! }
//! ```

mod installation;
pub mod oauth;

pub use installation::{CompletedInstallation, InstallationNegotiator};
