//! Inbound messages as handed over by the host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// What the inbound message means for the dialogue.
///
/// Tags other than `new`, `resume` and `close` are kept verbatim and
/// handled exactly like `resume`. A null tag reads as `resume`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SessionEvent {
    New,
    #[default]
    Resume,
    Close,
    Other(String),
}

impl SessionEvent {
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::Resume => "resume",
            Self::Close => "close",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for SessionEvent {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "new" => Self::New,
            "resume" => Self::Resume,
            "close" => Self::Close,
            _ => Self::Other(tag),
        }
    }
}

impl From<Option<String>> for SessionEvent {
    fn from(tag: Option<String>) -> Self {
        tag.map(Self::from).unwrap_or_default()
    }
}

impl From<&str> for SessionEvent {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<SessionEvent> for String {
    fn from(event: SessionEvent) -> Self {
        event.as_str().to_string()
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message from a user.
///
/// `content: None` (no content field) and `content: Some("")` are distinct:
/// only the latter is dispatched to the active state as input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message_id: String,
    pub from_addr: String,

    #[serde(default)]
    pub content: Option<String>,

    #[serde(default)]
    pub session_event: SessionEvent,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl InboundMessage {
    /// A message with a generated id and no content.
    pub fn new(from_addr: impl Into<String>, session_event: impl Into<SessionEvent>) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            from_addr: from_addr.into(),
            content: None,
            session_event: session_event.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }
}
