//! Event primitive shared by the controller, sessions and states.
//!
//! - [`Event`]: an immutable, tagged notification
//! - [`Emitter`]: ordered listener registration plus an `emit` that joins on
//!   every listener before resolving

mod emitter;
mod event;

pub use emitter::{listener, Emitter, Listener, ListenerError, ListenerFuture};
pub use event::{Event, EventKind};
