//! Session persistence error types.

use thiserror::Error;

/// Errors that can occur while converting sessions to and from storage
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SnapshotError {
    /// Serialization to JSON failed
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    /// Stored value is not a valid session record
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Stored record belongs to a different address
    #[error("Stored session is for '{found}', expected '{expected}'")]
    AddressMismatch { expected: String, found: String },

    /// No record exists for an address that had to be loaded
    #[error("No stored session for '{0}'")]
    NotFound(String),
}
