use thiserror::Error;

/// Errors that can occur when reading or writing snapshots.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing storage failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The store refused the write.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for snapshot store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
