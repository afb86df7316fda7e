//! The contract every dialogue state implements.

use crate::config::ImConfig;
use crate::error::Result;
use crate::events::Emitter;
use crate::resources::{ConfigSource, Translator};
use crate::session::Session;
use async_trait::async_trait;

use super::record::Metadata;

/// What a state can see and change while it handles a turn.
pub struct StateContext<'a> {
    /// The session being served. States record answers and metadata here.
    pub session: &'a mut Session,

    /// The application's validated configuration.
    pub config: &'a ImConfig,

    /// Metadata restored for this state from the session record.
    pub metadata: &'a Metadata,

    /// Where translations are fetched from.
    pub config_source: &'a dyn ConfigSource,
}

impl StateContext<'_> {
    /// Translator for the session's current language.
    pub fn translator(&self) -> &Translator {
        self.session.translator()
    }

    /// Switch the session to `lang`, loading its translations.
    pub async fn set_lang(&mut self, lang: &str) -> Result<()> {
        self.session.set_lang(lang, self.config_source).await
    }
}

/// One node of the dialogue graph.
///
/// Instances are created fresh on every transition into them and dropped
/// once the controller moves on. The lifecycle is:
///
/// 1. `setup` (asynchronous preparation)
/// 2. `state:enter` emitted on the controller, then on the state
/// 3. `input` for each message received while the state is active
/// 4. `state:exit` emitted on the controller, then on the state
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use parley::core::{State, StateContext};
/// use parley::events::Emitter;
/// use parley::Result;
///
/// struct Echo {
///     emitter: Emitter,
///     last: String,
/// }
///
/// #[async_trait]
/// impl State for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn emitter(&self) -> &Emitter {
///         &self.emitter
///     }
///
///     async fn input(
///         &mut self,
///         _ctx: &mut StateContext<'_>,
///         content: &str,
///     ) -> Result<Option<String>> {
///         self.last = content.to_string();
///         Ok(Some("echo".into()))
///     }
///
///     fn display(&self) -> String {
///         format!("You said: {}", self.last)
///     }
/// }
/// ```
#[async_trait]
pub trait State: Send + Sync {
    /// The state's registered name.
    fn name(&self) -> &str;

    /// The state's own emitter, for `state:*` and `session:new` events.
    fn emitter(&self) -> &Emitter;

    /// The name stored in the session record while this state is active.
    ///
    /// Defaults to [`State::name`]. The synthesized error state returns
    /// `None` so the next message restarts from the start state.
    fn persisted_name(&self) -> Option<&str> {
        Some(self.name())
    }

    /// Asynchronous preparation, run before the state is entered.
    async fn setup(&mut self, _ctx: &mut StateContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Handle content from the user and return the next state's name.
    ///
    /// Returning the current name keeps the session here without
    /// re-firing enter/exit. Returning `None` clears the current state.
    async fn input(&mut self, _ctx: &mut StateContext<'_>, _content: &str) -> Result<Option<String>> {
        Ok(self.persisted_name().map(str::to_string))
    }

    /// Translate any copy that has not been translated yet.
    fn translate(&mut self, _translator: &Translator) {}

    /// Content sent to the user.
    fn display(&self) -> String;

    /// Whether the dialogue stays open after this state's reply.
    fn continue_session(&self) -> bool {
        true
    }

    /// Whether this state's output is sent this turn.
    fn send_reply(&self) -> bool {
        true
    }
}
