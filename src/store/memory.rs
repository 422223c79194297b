//! Process-local store backed by mutex-guarded maps.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::config::StorefrontId;

use super::{
    AbandonedCheckout, CheckoutStore, InsertOutcome, Installation, NewAbandonedCheckout,
    NewInstallation, ShopStore, StoreError,
};

#[derive(Debug, Default)]
struct State {
    installations: HashMap<StorefrontId, Installation>,
    checkouts: HashMap<String, AbandonedCheckout>,
    next_id: i64,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory [`ShopStore`] and [`CheckoutStore`].
///
/// Each map is checked and written under a single lock, so the uniqueness
/// rules hold under concurrent use. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl ShopStore for MemoryStore {
    fn find_by_shop(&self, shop: &StorefrontId) -> Result<Option<Installation>, StoreError> {
        Ok(self.lock()?.installations.get(shop).cloned())
    }

    fn upsert(&self, installation: NewInstallation) -> Result<Installation, StoreError> {
        let mut state = self.lock()?;
        let existing_id = state.installations.get(&installation.shop).map(|i| i.id);
        let id = match existing_id {
            Some(id) => id,
            None => state.allocate_id(),
        };

        let record = Installation {
            id,
            shop: installation.shop,
            access_token: installation.access_token,
            scope: installation.scope,
            active: true,
            installed_at: installation.installed_at,
        };
        state
            .installations
            .insert(record.shop.clone(), record.clone());
        Ok(record)
    }
}

impl CheckoutStore for MemoryStore {
    fn insert_if_absent(&self, checkout: NewAbandonedCheckout) -> Result<InsertOutcome, StoreError> {
        if !checkout.recovery_url_fits() {
            return Err(StoreError::Constraint {
                reason: "recovery_url exceeds maximum length".to_string(),
            });
        }

        let mut state = self.lock()?;
        if state.checkouts.contains_key(&checkout.checkout_id) {
            return Ok(InsertOutcome::Duplicate);
        }

        let record = checkout.into_record(state.allocate_id());
        state
            .checkouts
            .insert(record.checkout_id.clone(), record.clone());
        Ok(InsertOutcome::Inserted(record))
    }

    fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<AbandonedCheckout>, StoreError> {
        Ok(self.lock()?.checkouts.get(checkout_id).cloned())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.checkouts.len())
    }
}

// Verify MemoryStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MemoryStore>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessToken;
    use crate::store::MAX_RECOVERY_URL_LEN;
    use std::sync::Arc;

    fn installation(shop: &str, token: &str) -> NewInstallation {
        NewInstallation::now(
            StorefrontId::new(shop).unwrap(),
            AccessToken::new(token).unwrap(),
            "read_orders",
        )
    }

    #[test]
    fn test_upsert_inserts_then_updates_in_place() {
        let store = MemoryStore::new();

        let first = store.upsert(installation("demo.example", "tok_1")).unwrap();
        assert!(first.active);

        let second = store.upsert(installation("demo.example", "tok_2")).unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.access_token.as_ref(), "tok_2");

        let found = store
            .find_by_shop(&StorefrontId::new("demo.example").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(found, second);
    }

    #[test]
    fn test_upsert_keeps_shops_separate() {
        let store = MemoryStore::new();
        let a = store.upsert(installation("a.example", "tok_a")).unwrap();
        let b = store.upsert(installation("b.example", "tok_b")).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_insert_if_absent_is_idempotent() {
        let store = MemoryStore::new();
        let record = NewAbandonedCheckout::pending("555", None, Some("a@b.com".into()), None);

        let first = store.insert_if_absent(record.clone()).unwrap();
        assert!(matches!(first, InsertOutcome::Inserted(ref r) if r.checkout_id == "555"));
        assert_eq!(
            store.insert_if_absent(record).unwrap(),
            InsertOutcome::Duplicate
        );
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_insert_rejects_oversized_recovery_url() {
        let store = MemoryStore::new();
        let record = NewAbandonedCheckout::pending(
            "1",
            None,
            Some("a@b.com".into()),
            Some("x".repeat(MAX_RECOVERY_URL_LEN + 1)),
        );

        assert!(matches!(
            store.insert_if_absent(record),
            Err(StoreError::Constraint { .. })
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_concurrent_duplicate_inserts_store_once() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .insert_if_absent(NewAbandonedCheckout::pending(
                            "777",
                            None,
                            Some("a@b.com".into()),
                            None,
                        ))
                        .unwrap()
                })
            })
            .collect();

        let inserted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| matches!(outcome, InsertOutcome::Inserted(_)))
            .count();

        assert_eq!(inserted, 1);
        assert_eq!(store.count().unwrap(), 1);
    }
}
