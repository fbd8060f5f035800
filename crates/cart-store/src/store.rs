use async_trait::async_trait;

use crate::{Result, Snapshot};

/// Durable key-value storage for snapshots.
///
/// Implementations keep exactly one snapshot per key. All implementations
/// must be thread-safe (Send + Sync).
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Retrieves the snapshot stored under `key`.
    ///
    /// Returns None if nothing has been stored yet.
    async fn get(&self, key: &str) -> Result<Option<Snapshot>>;

    /// Stores a snapshot under its key, replacing any previous one.
    async fn put(&self, snapshot: Snapshot) -> Result<()>;
}
