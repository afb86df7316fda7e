//! The per-address session entity.

use super::error::SnapshotError;
use super::snapshot::SessionSnapshot;
use crate::core::{Metadata, StateRecord};
use crate::error::Result;
use crate::events::{Emitter, Event};
use crate::resources::{ConfigSource, Storage, Translator};
use serde_json::{Map, Value};

/// Overrides applied when a session is set up.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserOptions {
    /// Language used when the stored record has none.
    pub lang: Option<String>,

    /// Namespace the session is stored under.
    pub store_name: Option<String>,
}

/// Durable record of one user's progress through the dialogue.
///
/// A controller owns exactly one session for the duration of an invocation.
/// The session is created empty so listeners can be attached before it is
/// loaded; `load_or_create` (or `reset`) then fills it for an address.
pub struct Session {
    addr: String,
    lang: Option<String>,
    answers: Map<String, Value>,
    metadata: Metadata,
    store_name: Option<String>,
    state: StateRecord,
    translator: Translator,
    emitter: Emitter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            addr: String::new(),
            lang: None,
            answers: Map::new(),
            metadata: Metadata::new(),
            store_name: None,
            state: StateRecord::new(),
            translator: Translator::identity(),
            emitter: Emitter::new("user"),
        }
    }

    /// Storage key for `addr`: `users.<store_name>.<addr>`, or
    /// `users.<addr>` without a store name.
    pub fn make_key(store_name: Option<&str>, addr: &str) -> String {
        match store_name {
            Some(store) => format!("users.{store}.{addr}"),
            None => format!("users.{addr}"),
        }
    }

    pub fn key(&self) -> String {
        Self::make_key(self.store_name.as_deref(), &self.addr)
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    pub fn store_name(&self) -> Option<&str> {
        self.store_name.as_deref()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn state(&self) -> &StateRecord {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateRecord {
        &mut self.state
    }

    /// With `None`, whether the session is in any state at all; otherwise
    /// whether it is in the named state.
    pub fn is_in_state(&self, state_name: Option<&str>) -> bool {
        match state_name {
            None => self.state.exists(),
            Some(name) => self.state.is(name),
        }
    }

    pub fn answers(&self) -> &Map<String, Value> {
        &self.answers
    }

    pub fn answer(&self, state_name: &str) -> Option<&Value> {
        self.answers.get(state_name)
    }

    /// Record the user's latest answer to `state_name`.
    pub fn set_answer(&mut self, state_name: &str, answer: impl Into<Value>) {
        self.answers.insert(state_name.to_string(), answer.into());
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            addr: self.addr.clone(),
            lang: self.lang.clone(),
            answers: self.answers.clone(),
            metadata: self.metadata.clone(),
            state: self.state.clone(),
        }
    }

    /// Rebuild a session from stored data. Listeners are not restored.
    pub fn from_snapshot(snapshot: SessionSnapshot, store_name: Option<String>) -> Self {
        let mut session = Self::new();
        session.apply(snapshot, store_name);
        session
    }

    fn apply(&mut self, snapshot: SessionSnapshot, store_name: Option<String>) {
        self.addr = snapshot.addr;
        self.lang = snapshot.lang;
        self.answers = snapshot.answers;
        self.metadata = snapshot.metadata;
        self.state = snapshot.state;
        self.store_name = store_name;
        self.translator = Translator::identity();
    }

    async fn setup(
        &mut self,
        addr: &str,
        stored: Option<SessionSnapshot>,
        opts: UserOptions,
        config: &dyn ConfigSource,
    ) -> Result<()> {
        let mut snapshot = stored.unwrap_or_else(|| SessionSnapshot {
            addr: addr.to_string(),
            lang: None,
            answers: Map::new(),
            metadata: Metadata::new(),
            state: StateRecord::new(),
        });
        snapshot.lang = snapshot.lang.or(opts.lang);

        self.apply(snapshot, opts.store_name);
        self.refresh_translator(config).await?;
        self.emitter.emit_setup().await
    }

    /// Set up a fresh session for `addr`, discarding anything stored.
    pub async fn create(
        &mut self,
        addr: &str,
        opts: UserOptions,
        config: &dyn ConfigSource,
    ) -> Result<()> {
        self.setup(addr, None, opts, config).await?;
        self.emitter
            .emit(Event::UserNew {
                addr: self.addr.clone(),
            })
            .await
    }

    /// Alias of [`Session::create`] used for forced restarts.
    pub async fn reset(
        &mut self,
        addr: &str,
        opts: UserOptions,
        config: &dyn ConfigSource,
    ) -> Result<()> {
        self.create(addr, opts, config).await
    }

    /// Load the stored session for `addr`, failing if there is none.
    pub async fn load(
        &mut self,
        addr: &str,
        opts: UserOptions,
        storage: &dyn Storage,
        config: &dyn ConfigSource,
    ) -> Result<()> {
        let stored = Self::fetch(addr, opts.store_name.as_deref(), storage).await?;
        let Some(snapshot) = stored else {
            return Err(SnapshotError::NotFound(addr.to_string()).into());
        };

        self.setup(addr, Some(snapshot), opts, config).await?;
        self.emitter
            .emit(Event::UserLoad {
                addr: self.addr.clone(),
            })
            .await
    }

    /// Load the stored session for `addr`, or create one if none exists.
    /// Emits `user:load` or `user:new` accordingly.
    pub async fn load_or_create(
        &mut self,
        addr: &str,
        opts: UserOptions,
        storage: &dyn Storage,
        config: &dyn ConfigSource,
    ) -> Result<()> {
        let stored = Self::fetch(addr, opts.store_name.as_deref(), storage).await?;
        let event = match stored {
            Some(_) => Event::UserLoad {
                addr: addr.to_string(),
            },
            None => Event::UserNew {
                addr: addr.to_string(),
            },
        };

        self.setup(addr, stored, opts, config).await?;
        self.emitter.emit(event).await
    }

    async fn fetch(
        addr: &str,
        store_name: Option<&str>,
        storage: &dyn Storage,
    ) -> Result<Option<SessionSnapshot>> {
        let key = Self::make_key(store_name, addr);
        let Some(value) = storage.get(&key).await? else {
            return Ok(None);
        };

        let snapshot = SessionSnapshot::from_value(value)?;
        snapshot.validate_for(addr)?;
        Ok(Some(snapshot))
    }

    /// Change language, refreshing the translator if it differs.
    pub async fn set_lang(&mut self, lang: &str, config: &dyn ConfigSource) -> Result<()> {
        if self.lang.as_deref() == Some(lang) {
            return Ok(());
        }
        self.lang = Some(lang.to_string());
        self.refresh_translator(config).await
    }

    /// Re-fetch the translator for the current language.
    pub async fn refresh_translator(&mut self, config: &dyn ConfigSource) -> Result<()> {
        self.translator = match self.lang.as_deref() {
            Some(lang) => Translator::fetch(config, lang).await?,
            None => Translator::identity(),
        };
        Ok(())
    }

    /// Write the session to storage, then emit `user:save`.
    pub async fn save(&self, storage: &dyn Storage) -> Result<()> {
        let value = self.snapshot().to_value()?;
        storage.set(&self.key(), value).await?;
        self.emitter
            .emit(Event::UserSave {
                addr: self.addr.clone(),
            })
            .await
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("addr", &self.addr)
            .field("lang", &self.lang)
            .field("answers", &self.answers)
            .field("metadata", &self.metadata)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::testing::{MemoryStorage, StaticConfig};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn opts(store: &str) -> UserOptions {
        UserOptions {
            lang: None,
            store_name: Some(store.to_string()),
        }
    }

    fn record_events(session: &Session, kinds: &[EventKind]) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in kinds {
            let log = Arc::clone(&seen);
            session.emitter().on_sync(kind.clone(), move |event| {
                log.lock().unwrap().push(event.kind().to_string());
                Ok(())
            });
        }
        seen
    }

    #[test]
    fn key_includes_store_name() {
        assert_eq!(Session::make_key(Some("app"), "+27123"), "users.app.+27123");
        assert_eq!(Session::make_key(None, "+27123"), "users.+27123");
    }

    #[tokio::test]
    async fn unknown_address_creates_session() {
        let storage = MemoryStorage::new();
        let config = StaticConfig::new();
        let mut session = Session::new();
        let seen = record_events(&session, &[EventKind::UserNew, EventKind::UserLoad]);

        session
            .load_or_create("+27123", opts("app"), &storage, &config)
            .await
            .unwrap();

        assert_eq!(session.addr(), "+27123");
        assert_eq!(session.key(), "users.app.+27123");
        assert!(!session.is_in_state(None));
        assert_eq!(*seen.lock().unwrap(), vec!["user:new"]);
    }

    #[tokio::test]
    async fn stored_session_is_loaded() {
        let storage = MemoryStorage::new();
        storage.insert(
            "users.app.+27123",
            json!({"addr": "+27123", "lang": "en", "state": {"name": "ask_name"}}),
        );
        let config = StaticConfig::new();
        let mut session = Session::new();
        let seen = record_events(&session, &[EventKind::UserNew, EventKind::UserLoad]);

        session
            .load_or_create("+27123", opts("app"), &storage, &config)
            .await
            .unwrap();

        assert!(session.is_in_state(Some("ask_name")));
        assert_eq!(session.lang(), Some("en"));
        assert_eq!(*seen.lock().unwrap(), vec!["user:load"]);
    }

    #[tokio::test]
    async fn stored_language_wins_over_default() {
        let storage = MemoryStorage::new();
        storage.insert("users.app.+1", json!({"addr": "+1", "lang": "sw"}));
        let mut session = Session::new();

        let opts = UserOptions {
            lang: Some("en".into()),
            store_name: Some("app".into()),
        };
        session
            .load_or_create("+1", opts, &storage, &StaticConfig::new())
            .await
            .unwrap();

        assert_eq!(session.lang(), Some("sw"));
    }

    #[tokio::test]
    async fn load_requires_a_stored_record() {
        let storage = MemoryStorage::new();
        let mut session = Session::new();

        let result = session
            .load("+27123", opts("app"), &storage, &StaticConfig::new())
            .await;

        assert!(matches!(
            result,
            Err(crate::Error::Snapshot(SnapshotError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn reset_ignores_stored_record() {
        let storage = MemoryStorage::new();
        storage.insert(
            "users.app.+1",
            json!({"addr": "+1", "answers": {"q": "a"}, "state": {"name": "q"}}),
        );
        let mut session = Session::new();

        session
            .reset("+1", opts("app"), &StaticConfig::new())
            .await
            .unwrap();

        assert!(session.answers().is_empty());
        assert!(!session.is_in_state(None));
    }

    #[tokio::test]
    async fn save_writes_snapshot_and_emits() {
        let storage = MemoryStorage::new();
        let config = StaticConfig::new();
        let mut session = Session::new();
        let seen = record_events(&session, &[EventKind::UserSave]);

        session
            .create("+27123", opts("app"), &config)
            .await
            .unwrap();
        session.set_answer("ask_name", "Luke");
        session.state_mut().reset(Some("done".into()));

        session.save(&storage).await.unwrap();

        let stored = storage.value("users.app.+27123").unwrap();
        assert_eq!(stored["answers"]["ask_name"], json!("Luke"));
        assert_eq!(stored["state"]["name"], json!("done"));
        assert_eq!(*seen.lock().unwrap(), vec!["user:save"]);
    }

    #[tokio::test]
    async fn set_lang_refreshes_translator() {
        let config = StaticConfig::new().with("translation.af", json!({"Hello": "Hallo"}));
        let mut session = Session::new();
        session
            .create("+1", UserOptions::default(), &config)
            .await
            .unwrap();
        assert_eq!(session.translator().gettext("Hello"), "Hello");

        session.set_lang("af", &config).await.unwrap();

        assert_eq!(session.lang(), Some("af"));
        assert_eq!(session.translator().gettext("Hello"), "Hallo");
    }

    #[tokio::test]
    async fn foreign_record_is_rejected() {
        let storage = MemoryStorage::new();
        storage.insert("users.app.+1", json!({"addr": "+2"}));
        let mut session = Session::new();

        let result = session
            .load_or_create("+1", opts("app"), &storage, &StaticConfig::new())
            .await;

        assert!(matches!(
            result,
            Err(crate::Error::Snapshot(SnapshotError::AddressMismatch { .. }))
        ));
    }
}
