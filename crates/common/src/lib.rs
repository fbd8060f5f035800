//! Types shared across the cart engine crates.

pub mod types;

pub use types::ItemId;
