//! Registry errors.

use thiserror::Error;

/// Errors raised while registering or creating states.
///
/// Only [`RegistryError::DuplicateState`] and
/// [`RegistryError::MissingStartState`] ever reach callers. The others are
/// logged during resolution and replaced by the error state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate state '{0}'")]
    DuplicateState(String),

    #[error("Start state not specified. Call .start_state(name) before .build()")]
    MissingStartState,

    #[error("Unknown start state '{0}'")]
    UnknownStartState(String),

    #[error("Creator for state '{requested}' created a state with a different name: '{created}'")]
    NameMismatch { requested: String, created: String },

    #[error("Creator for state '{state}' failed: {message}")]
    CreatorFailed { state: String, message: String },
}
