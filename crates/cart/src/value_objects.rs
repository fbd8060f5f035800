//! Value objects for the cart domain.

use common::ItemId;
use serde::{Deserialize, Serialize};

use crate::cart::RequestedAmount;
use crate::error::CartError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.cents < 0 { "-" } else { "" };
        let abs = self.cents.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

/// A catalog record. Display attributes are opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub price: Money,
    pub image: String,
}

impl Item {
    pub fn new(
        id: ItemId,
        title: impl Into<String>,
        price: Money,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            price,
            image: image.into(),
        }
    }
}

/// Available quantity for an item as reported by the stock oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: ItemId,
    pub amount: u32,
}

impl StockRecord {
    pub fn new(id: ItemId, amount: u32) -> Self {
        Self { id, amount }
    }
}

/// An item in the cart together with its quantity.
///
/// The amount is always at least one. Serialized flat, with the item's
/// attributes next to `amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    item: Item,
    amount: u32,
}

impl CartLine {
    /// Creates a line, rejecting a zero amount.
    pub fn new(item: Item, amount: u32) -> Result<Self, CartError> {
        if amount == 0 {
            return Err(CartError::InvalidAmount {
                amount: RequestedAmount::Whole(0),
            });
        }
        Ok(Self { item, amount })
    }

    pub(crate) fn with_amount(item: Item, amount: u32) -> Self {
        debug_assert!(amount >= 1);
        Self { item, amount }
    }

    pub fn id(&self) -> ItemId {
        self.item.id
    }

    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub(crate) fn set_amount(&mut self, amount: u32) {
        debug_assert!(amount >= 1);
        self.amount = amount;
    }
}
