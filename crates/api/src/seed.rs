//! Catalog and stock seed data for the in-memory collaborators.

use std::path::Path;

use cart::{InMemoryCatalog, InMemoryStockOracle, Item, StockRecord};
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read catalog seed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog seed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Products and stock levels served by the in-memory catalog and oracle.
///
/// ```json
/// { "products": [{"id": 1, "title": "…", "price": 17990, "image": "…"}],
///   "stock": [{"id": 1, "amount": 3}] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub products: Vec<Item>,
    #[serde(default)]
    pub stock: Vec<StockRecord>,
}

impl CatalogSeed {
    /// Reads a seed file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, SeedError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Builds a catalog holding the seeded products.
    pub fn catalog(&self) -> InMemoryCatalog {
        InMemoryCatalog::with_items(self.products.iter().cloned())
    }

    /// Builds a stock oracle holding the seeded stock levels.
    pub fn stock_oracle(&self) -> InMemoryStockOracle {
        InMemoryStockOracle::with_records(self.stock.iter().copied())
    }
}
