//! The cart value and its admissible transitions.

use common::ItemId;
use serde::{Deserialize, Serialize};

use crate::error::CartError;
use crate::value_objects::{CartLine, Item};

/// An ordered, identifier-unique sequence of cart lines.
///
/// Lines keep their insertion order. Transitions never mutate `self`: they
/// return the next cart, or an error and leave the caller holding the
/// unchanged value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

// Query methods
impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from lines taken as given, in order.
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Returns the lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns the line for an item.
    pub fn get(&self, item_id: ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id() == item_id)
    }

    /// Returns the quantity of an item, zero when absent.
    pub fn amount_of(&self, item_id: ItemId) -> u32 {
        self.get(item_id).map_or(0, CartLine::amount)
    }

    /// Returns true if the cart has a line for the item.
    pub fn contains(&self, item_id: ItemId) -> bool {
        self.get(item_id).is_some()
    }

    /// Returns the number of distinct lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the total number of units across all lines.
    pub fn total_units(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.amount())).sum()
    }

    fn position(&self, item_id: ItemId) -> Option<usize> {
        self.lines.iter().position(|line| line.id() == item_id)
    }
}

// Transitions
impl Cart {
    /// Adds one unit of `item`.
    ///
    /// An existing line is incremented in place; otherwise a line with amount
    /// one is appended. Fails with `OutOfStock` when the resulting amount
    /// would exceed `available`.
    pub fn increment(&self, item: &Item, available: u32) -> Result<Cart, CartError> {
        let current = self.amount_of(item.id);
        let out_of_stock = |requested| CartError::OutOfStock {
            item_id: item.id,
            requested,
            available,
        };

        let requested = current
            .checked_add(1)
            .ok_or_else(|| out_of_stock(u32::MAX))?;
        if available < requested {
            return Err(out_of_stock(requested));
        }

        let mut next = self.clone();
        match next.position(item.id) {
            Some(index) => next.lines[index].set_amount(requested),
            None => next.lines.push(CartLine::with_amount(item.clone(), 1)),
        }
        Ok(next)
    }

    /// Removes the whole line for `item_id`, whatever its amount.
    pub fn remove(&self, item_id: ItemId) -> Result<Cart, CartError> {
        let index = self
            .position(item_id)
            .ok_or(CartError::LineNotFound { item_id })?;

        let mut next = self.clone();
        next.lines.remove(index);
        Ok(next)
    }

    /// Replaces the amount of an existing line with exactly `amount`.
    ///
    /// The stock ceiling is checked before line existence, so an absent item
    /// asked for more than is available reports `OutOfStock`. Never creates
    /// a line.
    pub fn set_amount(
        &self,
        item_id: ItemId,
        amount: u32,
        available: u32,
    ) -> Result<Cart, CartError> {
        if amount == 0 {
            return Err(CartError::InvalidAmount {
                amount: RequestedAmount::Whole(0),
            });
        }

        if available < amount {
            return Err(CartError::OutOfStock {
                item_id,
                requested: amount,
                available,
            });
        }

        let index = self
            .position(item_id)
            .ok_or(CartError::LineNotFound { item_id })?;

        let mut next = self.clone();
        next.lines[index].set_amount(amount);
        Ok(next)
    }
}

/// A quantity as a caller supplied it, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedAmount {
    /// An integer, not yet range checked.
    Whole(i64),
    /// A value that is not an integer, kept in its JSON form.
    Malformed(String),
}

impl From<i64> for RequestedAmount {
    fn from(amount: i64) -> Self {
        RequestedAmount::Whole(amount)
    }
}

impl From<serde_json::Value> for RequestedAmount {
    fn from(value: serde_json::Value) -> Self {
        match value.as_i64() {
            Some(amount) => RequestedAmount::Whole(amount),
            None => RequestedAmount::Malformed(value.to_string()),
        }
    }
}

impl std::fmt::Display for RequestedAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestedAmount::Whole(amount) => write!(f, "{amount}"),
            RequestedAmount::Malformed(raw) => write!(f, "{raw}"),
        }
    }
}

/// Validates a requested quantity.
///
/// Anything below one, too large to be a quantity, or not an integer at all
/// is `InvalidAmount`.
pub fn validate_amount(amount: RequestedAmount) -> Result<u32, CartError> {
    let valid = match &amount {
        RequestedAmount::Whole(whole) => u32::try_from(*whole).ok().filter(|&a| a >= 1),
        RequestedAmount::Malformed(_) => None,
    };
    valid.ok_or(CartError::InvalidAmount { amount })
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartLine;
    type IntoIter = std::slice::Iter<'a, CartLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
