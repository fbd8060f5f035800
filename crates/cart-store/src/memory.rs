use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Result, Snapshot, SnapshotStore, StoreError};

/// In-memory snapshot store implementation for testing.
///
/// Clones share the same storage, so a test can keep a handle while the
/// engine owns another.
#[derive(Clone, Default)]
pub struct InMemorySnapshotStore {
    snapshots: Arc<RwLock<HashMap<String, Snapshot>>>,
    writes: Arc<AtomicUsize>,
    fail_on_put: Arc<AtomicBool>,
    put_latency_ms: Arc<AtomicU64>,
}

impl InMemorySnapshotStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the store to reject subsequent writes.
    pub fn set_fail_on_put(&self, fail: bool) {
        self.fail_on_put.store(fail, Ordering::SeqCst);
    }

    /// Delays every subsequent write by `latency`.
    pub fn set_put_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.put_latency_ms.store(millis, Ordering::SeqCst);
    }

    /// Returns the number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Returns the number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    /// Returns true if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<Snapshot>> {
        Ok(self.snapshots.read().await.get(key).cloned())
    }

    async fn put(&self, snapshot: Snapshot) -> Result<()> {
        let latency = self.put_latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.fail_on_put.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }

        self.snapshots
            .write()
            .await
            .insert(snapshot.key.clone(), snapshot);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
