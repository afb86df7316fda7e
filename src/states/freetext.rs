//! Free-form answer states.

use super::Next;
use crate::core::{Guard, State, StateContext};
use crate::error::Result;
use crate::events::Emitter;
use crate::resources::Translator;
use async_trait::async_trait;

/// Asks a question and accepts any answer that passes its guard.
///
/// Accepted answers are trimmed and saved under the state's name. A
/// rejected answer keeps the user here and shows the error text instead of
/// the question.
pub struct FreeText {
    name: String,
    question: String,
    error: String,
    rendered_question: Option<String>,
    rendered_error: Option<String>,
    check: Option<Guard>,
    next: Next,
    in_error: bool,
    continue_session: bool,
    send_reply: bool,
    emitter: Emitter,
}

impl FreeText {
    pub fn new(name: impl Into<String>, question: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            emitter: Emitter::new(format!("state:{name}")),
            name,
            question: question.into(),
            error: String::new(),
            rendered_question: None,
            rendered_error: None,
            check: None,
            next: Next::none(),
            in_error: false,
            continue_session: true,
            send_reply: true,
        }
    }

    pub fn next(mut self, next: impl Into<Next>) -> Self {
        self.next = next.into();
        self
    }

    /// Reject answers the guard refuses, showing `error` instead.
    pub fn check(mut self, guard: Guard, error: impl Into<String>) -> Self {
        self.check = Some(guard);
        self.error = error.into();
        self
    }

    pub fn continue_session(mut self, value: bool) -> Self {
        self.continue_session = value;
        self
    }

    pub fn send_reply(mut self, value: bool) -> Self {
        self.send_reply = value;
        self
    }

    pub fn in_error(&self) -> bool {
        self.in_error
    }
}

#[async_trait]
impl State for FreeText {
    fn name(&self) -> &str {
        &self.name
    }

    fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    async fn input(&mut self, ctx: &mut StateContext<'_>, content: &str) -> Result<Option<String>> {
        let answer = content.trim();

        if !self.check.as_ref().map_or(true, |g| g.check(answer)) {
            self.in_error = true;
            return Ok(Some(self.name.clone()));
        }

        self.in_error = false;
        ctx.session.set_answer(&self.name, answer);
        self.next.resolve(answer).await
    }

    fn translate(&mut self, translator: &Translator) {
        self.rendered_question = Some(translator.gettext(&self.question));
        if !self.error.is_empty() {
            self.rendered_error = Some(translator.gettext(&self.error));
        }
    }

    fn display(&self) -> String {
        if self.in_error {
            self.rendered_error
                .clone()
                .unwrap_or_else(|| self.error.clone())
        } else {
            self.rendered_question
                .clone()
                .unwrap_or_else(|| self.question.clone())
        }
    }

    fn continue_session(&self) -> bool {
        self.continue_session
    }

    fn send_reply(&self) -> bool {
        self.send_reply
    }
}
