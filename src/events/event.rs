//! Event values emitted by controllers, sessions and states.

use serde_json::{Map, Value};
use std::fmt;

/// Key used to register listeners for a family of events.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Setup,
    Teardown,
    StateEnter,
    StateExit,
    StateInput,
    SessionNew,
    SessionResume,
    SessionClose,
    UserNew,
    UserLoad,
    UserSave,
    Error,
    Custom(String),
}

impl EventKind {
    /// Wire name of the kind, e.g. `state:enter`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Setup => "setup",
            Self::Teardown => "teardown",
            Self::StateEnter => "state:enter",
            Self::StateExit => "state:exit",
            Self::StateInput => "state:input",
            Self::SessionNew => "session:new",
            Self::SessionResume => "session:resume",
            Self::SessionClose => "session:close",
            Self::UserNew => "user:new",
            Self::UserLoad => "user:load",
            Self::UserSave => "user:save",
            Self::Error => "im:error",
            Self::Custom(kind) => kind,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification handed to every listener registered for its kind.
///
/// Events are immutable once built. Contextual references (the state or
/// session an event concerns) are carried by name, so an event can be cloned
/// into each listener without borrowing from the emitter's owner.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// An instance finished constructing itself.
    Setup { owner: String },

    /// An instance finished its shutdown sequence.
    Teardown { owner: String },

    /// A state became the active state.
    StateEnter { state: String },

    /// The active state is being replaced.
    StateExit { state: String },

    /// The user sent content to the active state.
    StateInput { state: String, content: String },

    /// A new dialogue was opened.
    SessionNew,

    /// A message arrived for an open dialogue.
    SessionResume,

    /// The dialogue ended. `user_terminated` is true when the remote peer
    /// closed it (including time-outs), false when the application did.
    SessionClose { user_terminated: bool },

    /// A session was created for an address with no stored record.
    UserNew { addr: String },

    /// A stored session was loaded.
    UserLoad { addr: String },

    /// A session was written back to storage.
    UserSave { addr: String },

    /// An invocation failed.
    Error { message: String },

    /// Application-defined event.
    Custom {
        kind: String,
        attributes: Map<String, Value>,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Setup { .. } => EventKind::Setup,
            Self::Teardown { .. } => EventKind::Teardown,
            Self::StateEnter { .. } => EventKind::StateEnter,
            Self::StateExit { .. } => EventKind::StateExit,
            Self::StateInput { .. } => EventKind::StateInput,
            Self::SessionNew => EventKind::SessionNew,
            Self::SessionResume => EventKind::SessionResume,
            Self::SessionClose { .. } => EventKind::SessionClose,
            Self::UserNew { .. } => EventKind::UserNew,
            Self::UserLoad { .. } => EventKind::UserLoad,
            Self::UserSave { .. } => EventKind::UserSave,
            Self::Error { .. } => EventKind::Error,
            Self::Custom { kind, .. } => EventKind::Custom(kind.clone()),
        }
    }

    /// Build an application-defined event.
    pub fn custom(kind: impl Into<String>, attributes: Map<String, Value>) -> Self {
        Self::Custom {
            kind: kind.into(),
            attributes,
        }
    }

    /// Attribute view of the event's payload.
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        match self {
            Self::Setup { owner } | Self::Teardown { owner } => {
                attrs.insert("instance".into(), Value::from(owner.as_str()));
            }
            Self::StateEnter { state } | Self::StateExit { state } => {
                attrs.insert("state".into(), Value::from(state.as_str()));
            }
            Self::StateInput { state, content } => {
                attrs.insert("state".into(), Value::from(state.as_str()));
                attrs.insert("content".into(), Value::from(content.as_str()));
            }
            Self::SessionNew | Self::SessionResume => {}
            Self::SessionClose { user_terminated } => {
                attrs.insert("user_terminated".into(), Value::from(*user_terminated));
            }
            Self::UserNew { addr } | Self::UserLoad { addr } | Self::UserSave { addr } => {
                attrs.insert("addr".into(), Value::from(addr.as_str()));
            }
            Self::Error { message } => {
                attrs.insert("error".into(), Value::from(message.as_str()));
            }
            Self::Custom { attributes, .. } => attrs.clone_from(attributes),
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_follow_wire_format() {
        assert_eq!(EventKind::StateEnter.as_str(), "state:enter");
        assert_eq!(EventKind::SessionClose.as_str(), "session:close");
        assert_eq!(EventKind::Error.as_str(), "im:error");
        assert_eq!(EventKind::Custom("poll:done".into()).to_string(), "poll:done");
    }

    #[test]
    fn event_reports_its_kind() {
        let event = Event::StateInput {
            state: "ask_name".into(),
            content: "Luke".into(),
        };
        assert_eq!(event.kind(), EventKind::StateInput);

        let custom = Event::custom("poll:done", Map::new());
        assert_eq!(custom.kind(), EventKind::Custom("poll:done".into()));
    }

    #[test]
    fn attributes_expose_context() {
        let attrs = Event::SessionClose {
            user_terminated: true,
        }
        .attributes();
        assert_eq!(attrs.get("user_terminated"), Some(&Value::Bool(true)));

        let attrs = Event::StateInput {
            state: "ask_name".into(),
            content: "".into(),
        }
        .attributes();
        assert_eq!(attrs.get("state"), Some(&Value::from("ask_name")));
        assert_eq!(attrs.get("content"), Some(&Value::from("")));
    }
}
