//! State registry and resolution.
//!
//! An [`App`] maps state names to creators. Resolution never fails: unknown
//! names fall back to the start state, and creator failures degrade to a
//! synthesized error state that persists no state name.

mod builder;
pub mod error;

pub use builder::AppBuilder;
pub use error::RegistryError;

use crate::config::ImConfig;
use crate::core::{Metadata, State};
use crate::error::Result;
use crate::states::EndState;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, warn};

/// Name of the synthesized error state.
pub const ERROR_STATE: &str = "__error__";

/// Text shown by the synthesized error state.
pub const DEFAULT_ERROR_TEXT: &str = "An error occurred. Please try again later.";

/// What a creator receives besides the state name.
#[derive(Clone, Debug)]
pub struct CreatorContext {
    /// Options stored with the session record for this state.
    pub creator_opts: Metadata,

    /// The application's configuration.
    pub config: ImConfig,

    /// The session's language, if known.
    pub lang: Option<String>,
}

pub type CreatorFuture = BoxFuture<'static, Result<Box<dyn State>>>;

/// Builds a fresh state instance for a name.
pub type StateCreator = Arc<dyn Fn(String, CreatorContext) -> CreatorFuture + Send + Sync>;

/// A set of named states forming one application.
///
/// Immutable once built, so a single `App` can be shared behind an `Arc`
/// by concurrent invocations.
pub struct App {
    start_state: String,
    creators: HashMap<String, StateCreator>,
    error_text: String,
}

impl App {
    pub fn new(start_state: impl Into<String>) -> Self {
        Self {
            start_state: start_state.into(),
            creators: HashMap::new(),
            error_text: DEFAULT_ERROR_TEXT.to_string(),
        }
    }

    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn start_state(&self) -> &str {
        &self.start_state
    }

    pub fn error_text(&self) -> &str {
        &self.error_text
    }

    pub fn set_error_text(&mut self, text: impl Into<String>) {
        self.error_text = text.into();
    }

    pub fn has_creator(&self, name: &str) -> bool {
        self.creators.contains_key(name)
    }

    /// Registered state names, sorted.
    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.creators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Register a creator under `name`. Names are unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        creator: StateCreator,
    ) -> std::result::Result<(), RegistryError> {
        let name = name.into();
        if self.creators.contains_key(&name) {
            return Err(RegistryError::DuplicateState(name));
        }
        self.creators.insert(name, creator);
        Ok(())
    }

    /// Register an asynchronous creator.
    pub fn register_fn<F, Fut, S>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> std::result::Result<(), RegistryError>
    where
        F: Fn(String, CreatorContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S>> + Send + 'static,
        S: State + 'static,
    {
        let creator: StateCreator = Arc::new(move |name, ctx| {
            f(name, ctx)
                .map(|created| created.map(|state| Box::new(state) as Box<dyn State>))
                .boxed()
        });
        self.register(name, creator)
    }

    /// Register a synchronous constructor taking the state name.
    pub fn register_state<F, S>(
        &mut self,
        name: impl Into<String>,
        f: F,
    ) -> std::result::Result<(), RegistryError>
    where
        F: Fn(String) -> S + Send + Sync + 'static,
        S: State + 'static,
    {
        let creator: StateCreator = Arc::new(move |name, _ctx| {
            let state: Box<dyn State> = Box::new(f(name));
            futures::future::ready(Ok(state)).boxed()
        });
        self.register(name, creator)
    }

    /// The state shown when resolution fails.
    pub fn error_state(&self) -> Box<dyn State> {
        Box::new(EndState::error(ERROR_STATE, self.error_text.clone()))
    }

    /// Construct the state for `name`.
    ///
    /// - `None` or the start state's name: the start state
    /// - a registered name: that state
    /// - an unregistered name: the start state, with a warning
    ///
    /// Creator failures, including a missing start state, yield
    /// [`App::error_state`].
    pub async fn resolve(&self, name: Option<&str>, ctx: CreatorContext) -> Box<dyn State> {
        let target = match name {
            None => self.start_state.as_str(),
            Some(name) if name == self.start_state || self.has_creator(name) => name,
            Some(name) => {
                warn!(
                    state = %name,
                    start_state = %self.start_state,
                    "Unknown state, switching to start state"
                );
                self.start_state.as_str()
            }
        };

        match self.create(target, ctx).await {
            Ok(state) => state,
            Err(err) => {
                error!(state = %target, error = %err, "Switching to error state");
                self.error_state()
            }
        }
    }

    async fn create(
        &self,
        name: &str,
        ctx: CreatorContext,
    ) -> std::result::Result<Box<dyn State>, RegistryError> {
        let creator = self
            .creators
            .get(name)
            .ok_or_else(|| RegistryError::UnknownStartState(name.to_string()))?;

        let state = creator(name.to_string(), ctx)
            .await
            .map_err(|err| RegistryError::CreatorFailed {
                state: name.to_string(),
                message: err.to_string(),
            })?;

        if state.name() != name {
            return Err(RegistryError::NameMismatch {
                requested: name.to_string(),
                created: state.name().to_string(),
            });
        }

        Ok(state)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("start_state", &self.start_state)
            .field("states", &self.state_names())
            .field("error_text", &self.error_text)
            .finish()
    }
}
