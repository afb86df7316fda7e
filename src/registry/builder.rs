//! Fluent construction of an [`App`].

use super::{App, CreatorContext, RegistryError};
use crate::core::State;
use crate::error::Result;
use std::future::Future;

/// Builder for an [`App`].
///
/// Registration methods fail as soon as a name is registered twice.
///
/// ```rust
/// use parley::registry::AppBuilder;
/// use parley::states::{EndState, FreeText};
///
/// let app = AppBuilder::new()
///     .start_state("ask_name")
///     .state("ask_name", |name| FreeText::new(name, "What is your name?").next("bye"))?
///     .state("bye", |name| EndState::new(name, "Thanks!"))?
///     .build()?;
///
/// assert_eq!(app.start_state(), "ask_name");
/// # Ok::<(), parley::registry::RegistryError>(())
/// ```
pub struct AppBuilder {
    start_state: Option<String>,
    error_text: Option<String>,
    app: App,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            start_state: None,
            error_text: None,
            app: App::new(String::new()),
        }
    }

    /// Set the start state (required).
    pub fn start_state(mut self, name: impl Into<String>) -> Self {
        self.start_state = Some(name.into());
        self
    }

    /// Override the error state's text.
    pub fn error_text(mut self, text: impl Into<String>) -> Self {
        self.error_text = Some(text.into());
        self
    }

    /// Add a state built synchronously from its name.
    pub fn state<F, S>(mut self, name: impl Into<String>, f: F) -> std::result::Result<Self, RegistryError>
    where
        F: Fn(String) -> S + Send + Sync + 'static,
        S: State + 'static,
    {
        self.app.register_state(name, f)?;
        Ok(self)
    }

    /// Add an asynchronous creator.
    pub fn creator<F, Fut, S>(
        mut self,
        name: impl Into<String>,
        f: F,
    ) -> std::result::Result<Self, RegistryError>
    where
        F: Fn(String, CreatorContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S>> + Send + 'static,
        S: State + 'static,
    {
        self.app.register_fn(name, f)?;
        Ok(self)
    }

    /// Build the app.
    /// Returns an error if no start state was given.
    pub fn build(self) -> std::result::Result<App, RegistryError> {
        let start_state = self
            .start_state
            .filter(|name| !name.is_empty())
            .ok_or(RegistryError::MissingStartState)?;

        let mut app = self.app;
        app.start_state = start_state;
        if let Some(text) = self.error_text {
            app.set_error_text(text);
        }
        Ok(app)
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
