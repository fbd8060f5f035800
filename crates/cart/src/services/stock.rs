//! Stock oracle trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use common::ItemId;

use crate::error::ServiceError;
use crate::value_objects::StockRecord;

/// Reports how many units of an item are currently available.
///
/// Answers are never cached by the engine; every operation asks again.
#[async_trait]
pub trait StockOracle: Send + Sync {
    async fn stock(&self, item_id: ItemId) -> Result<StockRecord, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryStockState {
    available: HashMap<ItemId, u32>,
    unavailable: bool,
    latency: Option<Duration>,
}

/// In-memory stock oracle for testing and seeded deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStockOracle {
    state: Arc<RwLock<InMemoryStockState>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryStockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an oracle holding the given records.
    pub fn with_records(records: impl IntoIterator<Item = StockRecord>) -> Self {
        let oracle = Self::new();
        for record in records {
            oracle.set_available(record.id, record.amount);
        }
        oracle
    }

    /// Sets the available quantity for an item.
    pub fn set_available(&self, item_id: ItemId, amount: u32) {
        self.write().available.insert(item_id, amount);
    }

    /// Drops the record for an item, so lookups report it as missing.
    pub fn remove(&self, item_id: ItemId) {
        self.write().available.remove(&item_id);
    }

    /// Configures the oracle to fail every lookup.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.write().unavailable = unavailable;
    }

    /// Delays every lookup by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        self.write().latency = latency;
    }

    /// Returns the number of lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, InMemoryStockState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StockOracle for InMemoryStockOracle {
    async fn stock(&self, item_id: ItemId) -> Result<StockRecord, ServiceError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let latency = self
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(ServiceError::Unavailable(
                "stock service is not responding".to_string(),
            ));
        }

        state
            .available
            .get(&item_id)
            .map(|&amount| StockRecord::new(item_id, amount))
            .ok_or(ServiceError::NotFound(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reports_latest_quantity() {
        let oracle = InMemoryStockOracle::with_records([StockRecord::new(ItemId::new(1), 3)]);
        assert_eq!(oracle.stock(ItemId::new(1)).await.unwrap().amount, 3);

        oracle.set_available(ItemId::new(1), 0);
        assert_eq!(oracle.stock(ItemId::new(1)).await.unwrap().amount, 0);
        assert_eq!(oracle.lookup_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_item() {
        let oracle = InMemoryStockOracle::new();
        assert_eq!(
            oracle.stock(ItemId::new(5)).await,
            Err(ServiceError::NotFound(ItemId::new(5)))
        );
    }

    #[tokio::test]
    async fn test_removed_record_is_not_found() {
        let oracle = InMemoryStockOracle::with_records([StockRecord::new(ItemId::new(2), 4)]);
        oracle.remove(ItemId::new(2));
        assert_eq!(
            oracle.stock(ItemId::new(2)).await,
            Err(ServiceError::NotFound(ItemId::new(2)))
        );
    }

    #[tokio::test]
    async fn test_unavailable() {
        let oracle = InMemoryStockOracle::with_records([StockRecord::new(ItemId::new(1), 3)]);
        oracle.set_unavailable(true);
        assert!(matches!(
            oracle.stock(ItemId::new(1)).await,
            Err(ServiceError::Unavailable(_))
        ));
    }
}
