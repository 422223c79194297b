//! # Cart Guardian
//!
//! Installation handshake and abandoned-checkout webhook ingestion for a
//! Shopify app.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`AppConfig`] and [`AppConfigBuilder`], loadable
//!   from the environment
//! - HMAC-SHA256 signature checks for installation callbacks and webhook
//!   deliveries via [`auth::oauth::hmac`]
//! - The installation handshake via [`auth::InstallationNegotiator`]
//! - Idempotent ingestion of `checkouts/create` deliveries via
//!   [`webhooks::WebhookIngestor`]
//! - Webhook subscription after installation via [`webhooks::WebhookRegistrar`]
//! - In-memory and SQLite persistence via [`store`]
//!
//! HTTP routing is left to the host application: each entry point takes the
//! raw request pieces and returns a value the router can answer with directly.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cart_guardian::{AppConfig, ApiKey, ApiSecretKey, HostUrl};
//! use cart_guardian::auth::InstallationNegotiator;
//! use cart_guardian::store::MemoryStore;
//! use cart_guardian::webhooks::WebhookIngestor;
//!
//! let config = AppConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .host(HostUrl::new("https://your-app.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let store = Arc::new(MemoryStore::new());
//! let negotiator = InstallationNegotiator::from_config(config.clone(), store.clone()).unwrap();
//! let ingestor = WebhookIngestor::new(config, store.clone(), store);
//! # let _ = (negotiator, ingestor);
//! ```
//!
//! ## Installation
//!
//! ```rust,ignore
//! use cart_guardian::auth::oauth::CallbackParams;
//!
//! // GET /shopify/install?shop=...
//! let url = negotiator.authorization_url(shop)?;
//!
//! // GET /shopify/callback?...
//! let params = CallbackParams::from_query_string(raw_query);
//! let done = negotiator.complete_handshake(&params).await?;
//! ```
//!
//! ## Webhook Ingestion
//!
//! ```rust,ignore
//! use cart_guardian::webhooks::WebhookRequest;
//!
//! // POST /webhooks/checkouts/create
//! let request = WebhookRequest::from_headers(raw_body, |name| headers.get(name));
//! let outcome = ingestor.ingest(&request);
//! respond(outcome.status_code(), outcome.response_body());
//! ```
//!
//! ## Logging
//!
//! All components log through [`tracing`] with structured `shop`, `topic`
//! and `checkout_id` fields. Install any subscriber to collect them. Access
//! tokens and secrets are never logged.

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod store;
pub mod webhooks;

// Re-export public types at crate root for convenience
pub use config::{
    AccessToken, ApiKey, ApiSecretKey, ApiVersion, AppConfig, AppConfigBuilder, HostUrl,
    StorefrontId, WebhookSubscription,
};
pub use error::ConfigError;

pub use auth::oauth::{CallbackParams, OAuthError};
pub use auth::{CompletedInstallation, InstallationNegotiator};
pub use store::{CheckoutStore, MemoryStore, ShopStore, SqliteStore, StoreError};
pub use webhooks::{IngestOutcome, WebhookError, WebhookIngestor, WebhookRegistrar, WebhookRequest};
