//! Cart error types.

use common::ItemId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::RequestedAmount;

/// Classification of a failed cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The item has no catalog or stock entry, or the cart has no line for it.
    NotFound,
    /// The requested quantity exceeds the available stock.
    OutOfStock,
    /// The requested quantity is not a positive integer.
    InvalidAmount,
    /// A collaborator failed for a reason other than a missing record.
    Unavailable,
}

impl FailureKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::OutOfStock => "out_of_stock",
            FailureKind::InvalidAmount => "invalid_amount",
            FailureKind::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors returned by the catalog and stock oracle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service has no record for the item.
    #[error("No record for item {0}")]
    NotFound(ItemId),

    /// The service could not answer.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Errors that reject a cart operation.
///
/// A rejected operation leaves the cart and its snapshot exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The catalog or stock oracle does not know the item.
    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: ItemId },

    /// The cart has no line for the item.
    #[error("Item not in cart: {item_id}")]
    LineNotFound { item_id: ItemId },

    /// Not enough stock for the requested total.
    #[error("Out of stock: item {item_id} requested {requested}, available {available}")]
    OutOfStock {
        item_id: ItemId,
        requested: u32,
        available: u32,
    },

    /// Invalid quantity.
    #[error("Invalid amount: {amount} (must be at least 1)")]
    InvalidAmount { amount: RequestedAmount },

    /// A lookup failed.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl CartError {
    /// Returns the failure classification.
    pub fn kind(&self) -> FailureKind {
        match self {
            CartError::ItemNotFound { .. } | CartError::LineNotFound { .. } => {
                FailureKind::NotFound
            }
            CartError::OutOfStock { .. } => FailureKind::OutOfStock,
            CartError::InvalidAmount { .. } => FailureKind::InvalidAmount,
            CartError::Unavailable(_) => FailureKind::Unavailable,
        }
    }
}

impl From<ServiceError> for CartError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(item_id) => CartError::ItemNotFound { item_id },
            ServiceError::Unavailable(reason) => CartError::Unavailable(reason),
        }
    }
}
