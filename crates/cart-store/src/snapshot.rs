use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted value stored under a fixed key.
///
/// Only the latest snapshot per key is kept; writing a new one replaces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// The storage key this snapshot lives under.
    pub key: String,

    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,

    /// The serialized state.
    pub state: serde_json::Value,
}

impl Snapshot {
    /// Creates a new snapshot from raw JSON.
    pub fn new(key: impl Into<String>, state: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            saved_at: Utc::now(),
            state,
        }
    }

    /// Creates a snapshot from a serializable state.
    pub fn from_state<T: Serialize>(
        key: impl Into<String>,
        state: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(key, serde_json::to_value(state)?))
    }

    /// Deserializes the snapshot state into a concrete type.
    pub fn into_state<T: for<'de> Deserialize<'de>>(self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.state)
    }

    /// Gets a reference to the state as JSON.
    pub fn state_ref(&self) -> &serde_json::Value {
        &self.state
    }
}
