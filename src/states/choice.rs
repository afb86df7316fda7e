//! Numbered menus.

use super::Next;
use crate::core::{State, StateContext};
use crate::error::Result;
use crate::events::Emitter;
use crate::resources::Translator;
use async_trait::async_trait;

/// One option of a [`ChoiceState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    /// Saved as the answer when chosen.
    pub value: String,

    /// Shown to the user.
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Shows a question followed by numbered choices.
///
/// The user answers with a choice's number (starting at 1) or, when enabled,
/// its label. The chosen value is saved under the state's name and handed to
/// `next`. Anything else keeps the user here and prefixes the menu with the
/// error text.
pub struct ChoiceState {
    name: String,
    question: String,
    error: String,
    choices: Vec<Choice>,
    translator: Option<Translator>,
    accept_labels: bool,
    next: Next,
    in_error: bool,
    emitter: Emitter,
}

impl ChoiceState {
    pub fn new(
        name: impl Into<String>,
        question: impl Into<String>,
        choices: impl IntoIterator<Item = Choice>,
    ) -> Self {
        let name = name.into();
        Self {
            emitter: Emitter::new(format!("state:{name}")),
            name,
            question: question.into(),
            error: "Invalid choice.".to_string(),
            choices: choices.into_iter().collect(),
            translator: None,
            accept_labels: false,
            next: Next::none(),
            in_error: false,
        }
    }

    pub fn next(mut self, next: impl Into<Next>) -> Self {
        self.next = next.into();
        self
    }

    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.error = text.into();
        self
    }

    /// Also accept a choice's label, compared case-insensitively.
    pub fn accept_labels(mut self) -> Self {
        self.accept_labels = true;
        self
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn in_error(&self) -> bool {
        self.in_error
    }

    fn pick(&self, content: &str) -> Option<&Choice> {
        let content = content.trim();
        if let Ok(n) = content.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| self.choices.get(i));
        }
        if !self.accept_labels {
            return None;
        }
        self.choices
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(content))
    }

    /// Record the picked choice as the answer, or flag the error.
    fn accept(&mut self, ctx: &mut StateContext<'_>, content: &str) -> Option<Choice> {
        let picked = self.pick(content).cloned();
        self.in_error = picked.is_none();
        if let Some(choice) = &picked {
            ctx.session.set_answer(&self.name, choice.value.as_str());
        }
        picked
    }

    fn text(&self, msgid: &str) -> String {
        match &self.translator {
            Some(t) => t.gettext(msgid),
            None => msgid.to_string(),
        }
    }
}

#[async_trait]
impl State for ChoiceState {
    fn name(&self) -> &str {
        &self.name
    }

    fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    async fn input(&mut self, ctx: &mut StateContext<'_>, content: &str) -> Result<Option<String>> {
        match self.accept(ctx, content) {
            Some(choice) => self.next.resolve(&choice.value).await,
            None => Ok(Some(self.name.clone())),
        }
    }

    fn translate(&mut self, translator: &Translator) {
        self.translator = Some(translator.clone());
    }

    fn display(&self) -> String {
        let mut lines = Vec::with_capacity(self.choices.len() + 2);
        if self.in_error {
            lines.push(self.text(&self.error));
        }
        lines.push(self.text(&self.question));
        for (i, choice) in self.choices.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, self.text(&choice.label)));
        }
        lines.join("\n")
    }
}

/// A [`ChoiceState`] whose choice values name the next state.
pub struct MenuState {
    inner: ChoiceState,
}

impl MenuState {
    pub fn new(
        name: impl Into<String>,
        question: impl Into<String>,
        choices: impl IntoIterator<Item = Choice>,
    ) -> Self {
        let inner = ChoiceState::new(name, question, choices)
            .next(Next::dynamic(|value| async move { Ok(Some(value)) }));
        Self { inner }
    }

    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.inner = self.inner.error(text);
        self
    }

    pub fn accept_labels(mut self) -> Self {
        self.inner = self.inner.accept_labels();
        self
    }

    pub fn in_error(&self) -> bool {
        self.inner.in_error
    }
}

#[async_trait]
impl State for MenuState {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    async fn input(&mut self, ctx: &mut StateContext<'_>, content: &str) -> Result<Option<String>> {
        self.inner.input(ctx, content).await
    }

    fn translate(&mut self, translator: &Translator) {
        self.inner.translate(translator);
    }

    fn display(&self) -> String {
        self.inner.display()
    }
}

/// A [`ChoiceState`] whose choice values are language codes.
///
/// The picked language becomes the session's language before moving on, so
/// the next state is already shown in it.
pub struct LanguageChoice {
    inner: ChoiceState,
}

impl LanguageChoice {
    pub fn new(
        name: impl Into<String>,
        question: impl Into<String>,
        choices: impl IntoIterator<Item = Choice>,
    ) -> Self {
        Self {
            inner: ChoiceState::new(name, question, choices),
        }
    }

    pub fn next(mut self, next: impl Into<Next>) -> Self {
        self.inner = self.inner.next(next);
        self
    }

    pub fn error(mut self, text: impl Into<String>) -> Self {
        self.inner = self.inner.error(text);
        self
    }

    pub fn in_error(&self) -> bool {
        self.inner.in_error
    }
}

#[async_trait]
impl State for LanguageChoice {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn emitter(&self) -> &Emitter {
        &self.inner.emitter
    }

    async fn input(&mut self, ctx: &mut StateContext<'_>, content: &str) -> Result<Option<String>> {
        let Some(choice) = self.inner.accept(ctx, content) else {
            return Ok(Some(self.inner.name.clone()));
        };

        ctx.set_lang(&choice.value).await?;
        self.inner.next.resolve(&choice.value).await
    }

    fn translate(&mut self, translator: &Translator) {
        self.inner.translate(translator);
    }

    fn display(&self) -> String {
        self.inner.display()
    }
}
