//! Shopping cart engine.
//!
//! This crate provides the cart reconciliation core:
//! - Value objects for catalog items and cart lines
//! - Pure cart transitions that enforce the stock ceiling
//! - Traits for the catalog, stock oracle and notification sink
//! - `CartEngine`, the single holder of the session cart, which serializes
//!   mutations and writes every commit through to a snapshot store

pub mod cart;
pub mod engine;
pub mod error;
pub mod persistence;
pub mod services;
pub mod value_objects;

pub use cart::{Cart, RequestedAmount};
pub use common::ItemId;
pub use engine::{CartEngine, Outcome};
pub use error::{CartError, FailureKind, ServiceError};
pub use persistence::{CART_STORAGE_KEY, CartRepository};
pub use services::{
    Catalog, InMemoryCatalog, InMemoryStockOracle, Notification, NotificationSink, Operation,
    RecordingSink, StockOracle, TracingSink,
};
pub use value_objects::{CartLine, Item, Money, StockRecord};
