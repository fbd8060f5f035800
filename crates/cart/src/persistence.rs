//! Cart snapshots under a fixed storage key.

use cart_store::{Snapshot, SnapshotStore, StoreError};

use crate::cart::Cart;

/// Storage key of the session cart. Only one cart snapshot exists at a time.
pub const CART_STORAGE_KEY: &str = "@cart-engine:cart";

/// Reads and writes the session cart through a snapshot store.
#[derive(Debug, Clone)]
pub struct CartRepository<S> {
    store: S,
}

impl<S: SnapshotStore> CartRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the last saved cart, if any.
    pub async fn load(&self) -> Result<Option<Cart>, StoreError> {
        match self.store.get(CART_STORAGE_KEY).await? {
            Some(snapshot) => Ok(Some(snapshot.into_state()?)),
            None => Ok(None),
        }
    }

    /// Overwrites the saved cart.
    pub async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        let snapshot = Snapshot::from_state(CART_STORAGE_KEY, cart)?;
        self.store.put(snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{CartLine, Item, Money};
    use cart_store::InMemorySnapshotStore;
    use common::ItemId;

    fn cart() -> Cart {
        let line = |id: u64, amount: u32| {
            CartLine::new(
                Item::new(ItemId::new(id), "Shoe", Money::from_cents(100), "img"),
                amount,
            )
            .unwrap()
        };
        Cart::from_lines(vec![line(3, 2), line(1, 1)])
    }

    #[tokio::test]
    async fn test_load_without_snapshot() {
        let repository = CartRepository::new(InMemorySnapshotStore::new());
        assert!(repository.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let repository = CartRepository::new(InMemorySnapshotStore::new());
        repository.save(&cart()).await.unwrap();

        assert_eq!(repository.load().await.unwrap(), Some(cart()));
    }

    #[tokio::test]
    async fn test_save_of_load_is_content_noop() {
        let store = InMemorySnapshotStore::new();
        let repository = CartRepository::new(store.clone());
        repository.save(&cart()).await.unwrap();
        let before = store.get(CART_STORAGE_KEY).await.unwrap().unwrap().state;

        let loaded = repository.load().await.unwrap().unwrap();
        repository.save(&loaded).await.unwrap();

        let after = store.get(CART_STORAGE_KEY).await.unwrap().unwrap().state;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_an_error() {
        let store = InMemorySnapshotStore::new();
        store
            .put(Snapshot::new(
                CART_STORAGE_KEY,
                serde_json::json!({"lines": "nope"}),
            ))
            .await
            .unwrap();

        let repository = CartRepository::new(store);
        assert!(matches!(
            repository.load().await,
            Err(StoreError::Serialization(_))
        ));
    }
}
