//! Catalog trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::ItemId;

use crate::error::ServiceError;
use crate::value_objects::Item;

/// Read access to catalog records.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetches the catalog record for an item.
    async fn item(&self, item_id: ItemId) -> Result<Item, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    items: HashMap<ItemId, Item>,
    unavailable: bool,
}

/// In-memory catalog for testing and seeded deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the given items.
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let catalog = Self::new();
        for item in items {
            catalog.insert(item);
        }
        catalog
    }

    /// Inserts or replaces a record.
    pub fn insert(&self, item: Item) {
        self.write().items.insert(item.id, item);
    }

    pub fn remove(&self, item_id: ItemId) -> Option<Item> {
        self.write().items.remove(&item_id)
    }

    /// Configures the catalog to fail every lookup.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.write().unavailable = unavailable;
    }

    /// Returns the number of lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .items
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryCatalogState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Catalog for InMemoryCatalog {
    async fn item(&self, item_id: ItemId) -> Result<Item, ServiceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);

        if state.unavailable {
            return Err(ServiceError::Unavailable(
                "catalog is not responding".to_string(),
            ));
        }

        state
            .items
            .get(&item_id)
            .cloned()
            .ok_or(ServiceError::NotFound(item_id))
    }
}
