//! Persistence for installations and abandoned-checkout records.
//!
//! Two traits split the storage the handshake and the webhook ingestor need:
//!
//! - [`ShopStore`]: one [`Installation`] per storefront, upserted by the
//!   installation handshake
//! - [`CheckoutStore`]: [`AbandonedCheckout`] records, unique on
//!   `checkout_id`, written by webhook ingestion
//!
//! Both are implemented by [`MemoryStore`] (process-local, for tests and
//! single-instance deployments) and [`SqliteStore`] (`rusqlite`, with the
//! uniqueness rules enforced by the schema).
//!
//! Store operations are synchronous and short; callers in async contexts
//! call them directly.
//!
//! # Example
//!
//! ```rust
//! use cart_guardian::store::{CheckoutStore, InsertOutcome, MemoryStore, NewAbandonedCheckout};
//!
//! let store = MemoryStore::new();
//! let record = NewAbandonedCheckout::pending("555", None, Some("a@b.com".into()), None);
//!
//! assert!(matches!(store.insert_if_absent(record.clone()).unwrap(), InsertOutcome::Inserted(_)));
//! assert!(matches!(store.insert_if_absent(record).unwrap(), InsertOutcome::Duplicate));
//! assert_eq!(store.count().unwrap(), 1);
//! ```

mod memory;
mod models;
mod sqlite;

pub use memory::MemoryStore;
pub use models::{
    AbandonedCheckout, CheckoutStatus, Installation, NewAbandonedCheckout, NewInstallation,
    MAX_RECOVERY_URL_LEN,
};
pub use sqlite::SqliteStore;

use thiserror::Error;

use crate::config::StorefrontId;

/// Errors raised by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot serve requests (poisoned lock, exhausted pool).
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The underlying database reported an error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A record violates a constraint the store enforces.
    #[error("Constraint violated: {reason}")]
    Constraint {
        /// Which constraint was violated.
        reason: String,
    },
}

impl From<r2d2::Error> for StoreError {
    fn from(e: r2d2::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// Result of [`CheckoutStore::insert_if_absent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was written.
    Inserted(AbandonedCheckout),
    /// A record with the same `checkout_id` already existed; nothing changed.
    Duplicate,
}

/// Installation state per storefront.
pub trait ShopStore: Send + Sync {
    /// Looks up the installation for `shop`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn find_by_shop(&self, shop: &StorefrontId) -> Result<Option<Installation>, StoreError>;

    /// Updates the installation for `installation.shop` in place, or inserts
    /// one. An existing record keeps its `id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be written.
    fn upsert(&self, installation: NewInstallation) -> Result<Installation, StoreError>;
}

/// Abandoned-checkout records, unique on `checkout_id`.
pub trait CheckoutStore: Send + Sync {
    /// Writes `checkout` unless a record with the same `checkout_id` exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the record cannot be written.
    fn insert_if_absent(&self, checkout: NewAbandonedCheckout) -> Result<InsertOutcome, StoreError>;

    /// Looks up a record by the platform's checkout id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn find_by_checkout_id(&self, checkout_id: &str)
        -> Result<Option<AbandonedCheckout>, StoreError>;

    /// Returns the number of stored records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn count(&self) -> Result<usize, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_messages() {
        assert_eq!(
            StoreError::Unavailable("lock poisoned".to_string()).to_string(),
            "Store unavailable: lock poisoned"
        );
        let error = StoreError::Constraint {
            reason: "recovery_url too long".to_string(),
        };
        assert!(error.to_string().contains("recovery_url too long"));
    }

    #[test]
    fn test_rusqlite_error_converts() {
        let error: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(error, StoreError::Database(_)));
    }

    #[test]
    fn test_stores_are_object_safe() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let shops: std::sync::Arc<dyn ShopStore> = store.clone();
        let checkouts: std::sync::Arc<dyn CheckoutStore> = store;
        assert!(shops
            .find_by_shop(&StorefrontId::new("demo.example").unwrap())
            .unwrap()
            .is_none());
        assert_eq!(checkouts.count().unwrap(), 0);
    }
}
