//! Failure notifications.

use std::sync::{Arc, Mutex, PoisonError};

use common::ItemId;
use serde::Serialize;

use crate::error::{CartError, FailureKind};

/// The cart operation a notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Remove,
    SetAmount,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
            Operation::SetAmount => "set_amount",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A human-readable signal that an operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub operation: Operation,
    pub item_id: ItemId,
    pub kind: FailureKind,
    pub message: String,
}

impl Notification {
    /// Builds the notification shown for a rejected operation.
    pub fn rejected(operation: Operation, item_id: ItemId, error: &CartError) -> Self {
        let kind = error.kind();
        let message = match (operation, kind) {
            (Operation::Add | Operation::SetAmount, FailureKind::OutOfStock) => {
                "Requested quantity is out of stock"
            }
            (Operation::Add, _) => "Could not add item to cart",
            (Operation::Remove, _) => "Could not remove item from cart",
            (Operation::SetAmount, _) => "Could not update item amount",
        };

        Self {
            operation,
            item_id,
            kind,
            message: message.to_string(),
        }
    }
}

/// Receives failure notifications. One-way: nothing flows back to the engine.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Sink that logs every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: Notification) {
        tracing::warn!(
            operation = %notification.operation,
            item_id = %notification.item_id,
            kind = %notification.kind,
            "{}",
            notification.message
        );
    }
}

/// Sink that keeps notifications for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every notification received so far, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the kinds received so far, oldest first.
    pub fn kinds(&self) -> Vec<FailureKind> {
        self.notifications().iter().map(|n| n.kind).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
