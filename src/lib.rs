//! Parley: per-message session control for USSD and SMS dialogues.
//!
//! Every inbound message is handled start to finish by one
//! [`SessionController`]: it restores the sender's session, enters the state
//! the session points at, hands the message to that state, replies, and
//! persists the session. Every step emits events whose listeners are awaited
//! before the next step runs.
//!
//! # Core Concepts
//!
//! - **Events**: ordered listeners joined on every emission (`events`)
//! - **States**: dialogue nodes implementing the `State` trait (`core`, `states`)
//! - **Registry**: name to creator mapping with start/error fallbacks (`registry`)
//! - **Sessions**: per-address records stored as JSON (`session`)
//!
//! # Example
//!
//! ```rust
//! use parley::controller::{InboundMessage, SessionController};
//! use parley::config::SessionOptions;
//! use parley::registry::AppBuilder;
//! use parley::resources::Resources;
//! use parley::states::{EndState, FreeText};
//! use parley::testing::{MemoryStorage, RecordingOutbound, RecordingTransport, StaticConfig};
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let app = AppBuilder::new()
//!     .start_state("ask_name")
//!     .state("ask_name", |name| FreeText::new(name, "What is your name?").next("bye"))?
//!     .state("bye", |name| EndState::new(name, "Thanks!"))?
//!     .build()?;
//!
//! let outbound = Arc::new(RecordingOutbound::new());
//! let resources = Resources {
//!     transport: Arc::new(RecordingTransport::new()),
//!     storage: Arc::new(MemoryStorage::new()),
//!     outbound: outbound.clone(),
//!     config: Arc::new(StaticConfig::for_app("hello")),
//! };
//!
//! let mut controller = SessionController::new(Arc::new(app), resources, SessionOptions::default());
//! controller.handle_message(InboundMessage::new("+27123", "new")).await?;
//!
//! assert_eq!(outbound.replies()[0].content, "What is your name?");
//! # Ok::<(), parley::Error>(())
//! # }).unwrap();
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod core;
pub mod error;
pub mod events;
pub mod registry;
pub mod resources;
pub mod session;
pub mod states;
pub mod testing;

// Re-export commonly used types
pub use controller::{InboundMessage, SessionController, SessionEvent};
pub use core::{State, StateContext, StateRecord};
pub use error::{Error, Result};
pub use events::{Emitter, Event, EventKind};
pub use registry::{App, AppBuilder};
