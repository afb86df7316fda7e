//! Session entity and its persisted form.
//!
//! Sessions are keyed by address and stored as JSON snapshots under
//! `users.<store_name>.<addr>`.

pub mod error;
mod snapshot;
mod user;

pub use error::SnapshotError;
pub use snapshot::SessionSnapshot;
pub use user::{Session, UserOptions};
