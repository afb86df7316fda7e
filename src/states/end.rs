//! Terminal states.

use super::Next;
use crate::core::{State, StateContext};
use crate::error::Result;
use crate::events::Emitter;
use crate::resources::Translator;
use async_trait::async_trait;

/// Shows a message and ends the dialogue.
///
/// Any later input moves the user to `next`, which defaults to no state so
/// the following session starts over from the start state.
pub struct EndState {
    name: String,
    text: String,
    rendered: Option<String>,
    next: Next,
    persist_name: bool,
    emitter: Emitter,
}

impl EndState {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            emitter: Emitter::new(format!("state:{name}")),
            name,
            text: text.into(),
            rendered: None,
            next: Next::none(),
            persist_name: true,
        }
    }

    /// The state shown when resolution fails. It persists no state name, so
    /// the user's next message enters through the start state.
    pub fn error(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            persist_name: false,
            ..Self::new(name, text)
        }
    }

    pub fn next(mut self, next: impl Into<Next>) -> Self {
        self.next = next.into();
        self
    }
}

#[async_trait]
impl State for EndState {
    fn name(&self) -> &str {
        &self.name
    }

    fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    fn persisted_name(&self) -> Option<&str> {
        self.persist_name.then_some(self.name.as_str())
    }

    async fn input(&mut self, _ctx: &mut StateContext<'_>, content: &str) -> Result<Option<String>> {
        self.next.resolve(content).await
    }

    fn translate(&mut self, translator: &Translator) {
        self.rendered = Some(translator.gettext(&self.text));
    }

    fn display(&self) -> String {
        self.rendered.clone().unwrap_or_else(|| self.text.clone())
    }

    fn continue_session(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImConfig;
    use crate::core::Metadata;
    use crate::session::Session;
    use crate::testing::StaticConfig;
    use serde_json::json;

    fn config() -> ImConfig {
        ImConfig::from_value(Some(json!({"name": "test"}))).unwrap()
    }

    #[test]
    fn end_state_closes_session() {
        let state = EndState::new("bye", "Goodbye!");
        assert!(!state.continue_session());
        assert!(state.send_reply());
        assert_eq!(state.display(), "Goodbye!");
        assert_eq!(state.persisted_name(), Some("bye"));
    }

    #[test]
    fn error_state_persists_no_name() {
        let state = EndState::error("__error__", "Oops");
        assert_eq!(state.name(), "__error__");
        assert_eq!(state.persisted_name(), None);
    }

    #[tokio::test]
    async fn input_moves_to_next() {
        let mut session = Session::new();
        let config = config();
        let metadata = Metadata::new();
        let mut ctx = StateContext {
            session: &mut session,
            config: &config,
            metadata: &metadata,
            config_source: &StaticConfig::new(),
        };

        let mut state = EndState::new("bye", "Goodbye!");
        assert_eq!(state.input(&mut ctx, "hi").await.unwrap(), None);

        let mut state = EndState::new("bye", "Goodbye!").next("start");
        assert_eq!(
            state.input(&mut ctx, "hi").await.unwrap(),
            Some("start".into())
        );
    }

    #[test]
    fn translation_is_idempotent() {
        let translator = Translator::from_catalogue("af", &json!({"Goodbye!": "Totsiens!"}));
        let mut state = EndState::new("bye", "Goodbye!");

        state.translate(&translator);
        state.translate(&translator);

        assert_eq!(state.display(), "Totsiens!");
    }
}
