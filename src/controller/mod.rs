//! Inbound message handling.
//!
//! The host hands each inbound message to a fresh [`SessionController`],
//! which sequences config loading, session loading, state transitions,
//! the reply and persistence.

mod machine;
mod message;

pub use machine::SessionController;
pub use message::{InboundMessage, SessionEvent};
