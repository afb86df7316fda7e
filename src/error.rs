//! Crate-level error type.

use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::resources::ApiError;
use crate::session::SnapshotError;
use thiserror::Error;

/// Errors that abort an invocation.
///
/// State-resolution problems never surface here: the registry absorbs them
/// into the synthesized error state. Everything else propagates to the host.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Listener for '{kind}' failed: {message}")]
    Listener { kind: String, message: String },

    #[error("State '{state}' failed: {message}")]
    State { state: String, message: String },

    #[error("No active state")]
    NoActiveState,

    #[error("Controller has not been set up for a message")]
    NotSetUp,
}

impl Error {
    /// Build a failure raised by a state's own logic.
    pub fn state(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self::State {
            state: state.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
