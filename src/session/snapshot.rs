//! Serializable form of a session.

use super::error::SnapshotError;
use crate::core::{Metadata, StateRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything persisted for one address.
/// Does NOT include the translator or listeners (rebuilt on load).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Address the session belongs to
    pub addr: String,

    /// Language code selected by the user
    #[serde(default)]
    pub lang: Option<String>,

    /// Last answer given to each state, keyed by state name
    #[serde(default)]
    pub answers: Map<String, Value>,

    /// Free-form session metadata
    #[serde(default)]
    pub metadata: Metadata,

    /// Position in the dialogue
    #[serde(default)]
    pub state: StateRecord,
}

impl SessionSnapshot {
    pub fn to_value(&self) -> Result<Value, SnapshotError> {
        serde_json::to_value(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        serde_json::from_value(value)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
    }

    /// Reject a stored record that belongs to another address.
    pub fn validate_for(&self, addr: &str) -> Result<(), SnapshotError> {
        if self.addr != addr {
            return Err(SnapshotError::AddressMismatch {
                expected: addr.to_string(),
                found: self.addr.clone(),
            });
        }
        Ok(())
    }
}
