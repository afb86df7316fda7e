//! Ready-made states.
//!
//! - [`EndState`]: shows a message and closes the dialogue
//! - [`FreeText`]: asks a question and accepts any (checked) answer
//! - [`ChoiceState`]: numbered menu of choices
//! - [`MenuState`]: choices that name the next state
//! - [`LanguageChoice`]: choices that set the session's language

mod choice;
mod end;
mod freetext;

pub use choice::{Choice, ChoiceState, LanguageChoice, MenuState};
pub use end::EndState;
pub use freetext::FreeText;

use crate::error::Result;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// Async resolver for the next state, given the accepted answer.
pub type NextFn = Arc<dyn Fn(String) -> BoxFuture<'static, Result<Option<String>>> + Send + Sync>;

/// Where a state sends the user after an accepted answer.
#[derive(Clone)]
pub enum Next {
    /// A fixed state name, or `None` to clear the current state.
    Static(Option<String>),

    /// Computed from the answer, possibly asynchronously.
    Dynamic(NextFn),
}

impl Next {
    pub fn to(name: impl Into<String>) -> Self {
        Self::Static(Some(name.into()))
    }

    /// Clear the current state, so the next message starts over.
    pub fn none() -> Self {
        Self::Static(None)
    }

    pub fn dynamic<F, Fut>(f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<String>>> + Send + 'static,
    {
        Self::Dynamic(Arc::new(move |answer| f(answer).boxed()))
    }

    pub async fn resolve(&self, answer: &str) -> Result<Option<String>> {
        match self {
            Self::Static(name) => Ok(name.clone()),
            Self::Dynamic(f) => f(answer.to_string()).await,
        }
    }
}

impl From<&str> for Next {
    fn from(name: &str) -> Self {
        Self::to(name)
    }
}

impl From<String> for Next {
    fn from(name: String) -> Self {
        Self::to(name)
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static(name) => f.debug_tuple("Static").field(name).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_next_ignores_answer() {
        let next = Next::from("menu");
        assert_eq!(next.resolve("anything").await.unwrap(), Some("menu".into()));
        assert_eq!(Next::none().resolve("x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn dynamic_next_uses_answer() {
        let next = Next::dynamic(|answer| async move {
            Ok(Some(if answer == "yes" { "confirm" } else { "cancel" }.to_string()))
        });

        assert_eq!(next.resolve("yes").await.unwrap(), Some("confirm".into()));
        assert_eq!(next.resolve("no").await.unwrap(), Some("cancel".into()));
    }
}
