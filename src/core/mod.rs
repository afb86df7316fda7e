//! Core dialogue types.
//!
//! This module contains the pieces every application touches:
//! - The `State` trait and the context states are handed
//! - The session's state record
//! - Guard predicates for validating answers

mod guard;
mod record;
mod state;

pub use guard::Guard;
pub use record::{Metadata, StateRecord};
pub use state::{State, StateContext};
