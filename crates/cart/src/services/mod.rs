//! External collaborator traits and in-memory implementations.

pub mod catalog;
pub mod notify;
pub mod stock;

pub use catalog::{Catalog, InMemoryCatalog};
pub use notify::{Notification, NotificationSink, Operation, RecordingSink, TracingSink};
pub use stock::{InMemoryStockOracle, StockOracle};
