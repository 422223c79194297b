//! Inbound webhook deliveries and outbound webhook registration.
//!
//! - [`WebhookRequest`], [`verify_webhook`]: raw delivery and signature check
//! - [`WebhookIngestor`]: turns `checkouts/create` deliveries into
//!   abandoned-checkout records, answering with an [`IngestOutcome`]
//! - [`WebhookRegistrar`]: subscribes this app's endpoints after installation
//! - [`WebhookError`]: errors for all of the above
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use cart_guardian::webhooks::{WebhookIngestor, WebhookRequest};
//! use cart_guardian::store::MemoryStore;
//! use cart_guardian::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//! use cart_guardian::auth::oauth::hmac::compute_signature_base64;
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .host(HostUrl::new("https://app.example.com").unwrap())
//!     .build()
//!     .unwrap();
//! let store = Arc::new(MemoryStore::new());
//! let ingestor = WebhookIngestor::new(config, store.clone(), store);
//!
//! let body = br#"{"id":555,"email":"a@b.com"}"#;
//! let request = WebhookRequest::new(body.to_vec(), compute_signature_base64(body, "secret").unwrap());
//!
//! assert_eq!(ingestor.ingest(&request).status_code(), 200);
//! ```

mod errors;
mod ingest;
mod registrar;
mod types;
mod verification;

pub use errors::WebhookError;
pub use ingest::{IngestOutcome, SkipReason, WebhookIngestor};
pub use registrar::WebhookRegistrar;
pub use types::{
    CheckoutId, CheckoutPayload, RegistrationResult, RegistrationStatus, WebhookTopic,
};
pub use verification::{
    verify_webhook, WebhookContext, WebhookRequest, HEADER_API_VERSION, HEADER_HMAC,
    HEADER_SHOP_DOMAIN, HEADER_TOPIC, HEADER_WEBHOOK_ID,
};
