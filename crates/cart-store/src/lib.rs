pub mod error;
pub mod file;
pub mod memory;
pub mod snapshot;
pub mod store;

pub use error::{Result, StoreError};
pub use file::FileSnapshotStore;
pub use memory::InMemorySnapshotStore;
pub use snapshot::Snapshot;
pub use store::SnapshotStore;
