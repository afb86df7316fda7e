//! End-to-end invocations of the session controller against in-memory
//! collaborators.

use parley::config::SessionOptions;
use parley::controller::{InboundMessage, SessionController};
use parley::core::Guard;
use parley::events::{EventKind, ListenerError};
use parley::registry::{App, AppBuilder, CreatorContext, DEFAULT_ERROR_TEXT};
use parley::resources::{ConfigSource, Outbound, Resources, Storage, Transport};
use parley::states::{Choice, ChoiceState, EndState, FreeText, LanguageChoice, MenuState, Next};
use parley::testing::{MemoryStorage, RecordingOutbound, RecordingTransport, StaticConfig};
use parley::{Error, State};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const ADDR: &str = "+27123456789";
const KEY: &str = "users.hello.+27123456789";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn app() -> App {
    AppBuilder::new()
        .start_state("ask_name")
        .state("ask_name", |name| {
            FreeText::new(name, "What is your name?")
                .check(Guard::non_empty(), "Please tell us your name.")
                .next("menu")
        })
        .unwrap()
        .state("menu", |name| {
            ChoiceState::new(
                name,
                "Welcome! Choose:",
                [Choice::new("bye", "Leave"), Choice::new("ask_name", "Rename")],
            )
            .next(Next::dynamic(|value| async move { Ok(Some(value)) }))
        })
        .unwrap()
        .state("bye", |name| EndState::new(name, "Goodbye!"))
        .unwrap()
        .creator("broken", |_name, _ctx: CreatorContext| async {
            Err::<EndState, _>(Error::state("broken", "database offline"))
        })
        .unwrap()
        .build()
        .unwrap()
}

struct World {
    storage: Arc<MemoryStorage>,
    outbound: Arc<RecordingOutbound>,
    config: Arc<StaticConfig>,
    app: Arc<App>,
}

impl World {
    fn new() -> Self {
        Self::with_config(StaticConfig::for_app("hello"))
    }

    fn with_config(config: StaticConfig) -> Self {
        init_tracing();
        Self {
            storage: Arc::new(MemoryStorage::new()),
            outbound: Arc::new(RecordingOutbound::new()),
            config: Arc::new(config),
            app: Arc::new(app()),
        }
    }

    /// A fresh controller per invocation, sharing the collaborators.
    fn controller(&self) -> SessionController {
        let resources = Resources {
            transport: Arc::new(RecordingTransport::new()) as Arc<dyn Transport>,
            storage: self.storage.clone() as Arc<dyn Storage>,
            outbound: self.outbound.clone() as Arc<dyn Outbound>,
            config: self.config.clone() as Arc<dyn ConfigSource>,
        };
        SessionController::new(Arc::clone(&self.app), resources, SessionOptions::default())
    }

    fn stored(&self) -> Value {
        self.storage.value(KEY).unwrap_or(Value::Null)
    }

    fn store_state(&self, name: &str) {
        self.storage
            .insert(KEY, json!({"addr": ADDR, "state": {"name": name}}));
    }
}

fn record_kinds(
    controller: &SessionController,
    kinds: &[EventKind],
) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    for kind in kinds {
        let seen = Arc::clone(&seen);
        controller.emitter().on_sync(kind.clone(), move |event| {
            seen.lock().unwrap().push(format!("{event:?}"));
            Ok(())
        });
    }
    seen
}

#[tokio::test]
async fn new_address_gets_start_state() {
    let world = World::new();
    let msg = InboundMessage::new(ADDR, "new");
    let message_id = msg.message_id.clone();

    world.controller().handle_message(msg).await.unwrap();

    let replies = world.outbound.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].content, "What is your name?");
    assert_eq!(replies[0].in_reply_to, message_id);
    assert!(replies[0].continue_session);
    assert_eq!(world.stored()["state"]["name"], json!("ask_name"));
    assert_eq!(world.storage.writes(), vec![KEY.to_string()]);
}

#[tokio::test]
async fn resume_dispatches_content_to_stored_state() {
    let world = World::new();
    world.store_state("ask_name");

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "resume").with_content("Luke"))
        .await
        .unwrap();

    let replies = world.outbound.replies();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].content, "Welcome! Choose:\n1. Leave\n2. Rename");
    assert_eq!(world.stored()["state"]["name"], json!("menu"));
    assert_eq!(world.stored()["answers"]["ask_name"], json!("Luke"));
}

#[tokio::test]
async fn close_persists_without_reply() {
    let world = World::new();
    world.store_state("menu");
    let mut controller = world.controller();
    let seen = record_kinds(&controller, &[EventKind::SessionClose]);

    controller
        .handle_message(InboundMessage::new(ADDR, "close"))
        .await
        .unwrap();

    assert!(world.outbound.replies().is_empty());
    assert_eq!(world.storage.writes(), vec![KEY.to_string()]);
    assert_eq!(world.stored()["state"]["name"], json!("menu"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["SessionClose { user_terminated: true }"]
    );
}

#[tokio::test]
async fn empty_content_is_still_input() {
    let world = World::new();
    world.store_state("ask_name");
    let mut controller = world.controller();
    let seen = record_kinds(&controller, &[EventKind::StateInput]);

    controller
        .handle_message(InboundMessage::new(ADDR, "resume").with_content(""))
        .await
        .unwrap();

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(world.outbound.replies()[0].content, "Please tell us your name.");
    assert_eq!(world.stored()["state"]["name"], json!("ask_name"));
}

#[tokio::test]
async fn missing_content_skips_input() {
    let world = World::new();
    world.store_state("ask_name");
    let mut controller = world.controller();
    let seen = record_kinds(&controller, &[EventKind::StateInput, EventKind::SessionResume]);

    controller
        .handle_message(InboundMessage::new(ADDR, "resume"))
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["SessionResume"]);
    assert_eq!(world.outbound.replies()[0].content, "What is your name?");
}

#[tokio::test]
async fn unrecognised_session_event_behaves_like_resume() {
    let world = World::new();
    world.store_state("ask_name");

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "timeout").with_content("Leia"))
        .await
        .unwrap();

    assert_eq!(world.stored()["state"]["name"], json!("menu"));
    assert_eq!(world.outbound.replies().len(), 1);
}

#[tokio::test]
async fn failing_creator_shows_error_and_restarts_next_time() {
    let world = World::new();
    world.store_state("broken");

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "resume"))
        .await
        .unwrap();

    let replies = world.outbound.replies();
    assert_eq!(replies[0].content, DEFAULT_ERROR_TEXT);
    assert!(!replies[0].continue_session);
    assert_eq!(world.stored()["state"]["name"], Value::Null);

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "new"))
        .await
        .unwrap();

    assert_eq!(world.outbound.replies()[1].content, "What is your name?");
    assert_eq!(world.stored()["state"]["name"], json!("ask_name"));
}

#[tokio::test]
async fn unknown_stored_state_falls_back_to_start() {
    let stale = World::new();
    stale.store_state("removed_in_v2");
    stale
        .controller()
        .handle_message(InboundMessage::new(ADDR, "new"))
        .await
        .unwrap();

    let fresh = World::new();
    fresh
        .controller()
        .handle_message(InboundMessage::new(ADDR, "new"))
        .await
        .unwrap();

    let (stale_replies, fresh_replies) = (stale.outbound.replies(), fresh.outbound.replies());
    assert_eq!(stale_replies.len(), 1);
    assert_eq!(stale_replies[0].content, fresh_replies[0].content);
    assert_eq!(stale_replies[0].continue_session, fresh_replies[0].continue_session);
    assert_eq!(stale.stored()["state"], fresh.stored()["state"]);
}

#[tokio::test]
async fn listener_failure_aborts_before_reply_and_save() {
    let world = World::new();
    world.store_state("ask_name");
    let mut controller = world.controller();
    controller
        .emitter()
        .on_sync(EventKind::SessionResume, |_| Err(ListenerError::new("nope")));
    let errors = record_kinds(&controller, &[EventKind::Error]);

    let result = controller
        .handle_message(InboundMessage::new(ADDR, "resume").with_content("Luke"))
        .await;

    assert!(matches!(result, Err(Error::Listener { ref kind, .. }) if kind == "session:resume"));
    assert!(world.outbound.replies().is_empty());
    assert!(world.storage.writes().is_empty());
    assert_eq!(errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn storage_failure_surfaces_after_reply() {
    let world = World::new();
    world.storage.fail_writes();

    let result = world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "new"))
        .await;

    assert!(matches!(result, Err(Error::Api(_))));
    assert_eq!(world.outbound.replies().len(), 1);
}

#[tokio::test]
async fn transitions_emit_exit_then_enter_on_controller_then_state() {
    let world = World::new();
    world.store_state("ask_name");
    let log = Arc::new(Mutex::new(Vec::new()));

    let app = {
        let log = Arc::clone(&log);
        AppBuilder::new()
            .start_state("ask_name")
            .state("ask_name", |name| FreeText::new(name, "Name?").next("bye"))
            .unwrap()
            .creator("bye", move |name, _ctx| {
                let log = Arc::clone(&log);
                async move {
                    let state = EndState::new(name, "Bye");
                    state.emitter().on_sync(EventKind::StateEnter, move |_| {
                        log.lock().unwrap().push("state enter bye".to_string());
                        Ok(())
                    });
                    Ok(state)
                }
            })
            .unwrap()
            .build()
            .unwrap()
    };

    let resources = Resources {
        transport: Arc::new(RecordingTransport::new()) as Arc<dyn Transport>,
        storage: world.storage.clone() as Arc<dyn Storage>,
        outbound: world.outbound.clone() as Arc<dyn Outbound>,
        config: world.config.clone() as Arc<dyn ConfigSource>,
    };
    let mut controller =
        SessionController::new(Arc::new(app), resources, SessionOptions::default());
    for kind in [EventKind::StateExit, EventKind::StateEnter, EventKind::SessionClose] {
        let log = Arc::clone(&log);
        controller.emitter().on_sync(kind, move |event| {
            log.lock().unwrap().push(format!("controller {}", event.kind()));
            Ok(())
        });
    }

    controller
        .handle_message(InboundMessage::new(ADDR, "resume").with_content("Han"))
        .await
        .unwrap();

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "controller state:enter",
            "controller state:exit",
            "controller state:enter",
            "state enter bye",
            "controller session:close",
        ]
    );
    assert!(controller.is_in_state(Some("bye")));
}

#[tokio::test]
async fn stored_language_translates_reply() {
    let config = StaticConfig::for_app("hello")
        .with("translation.sw", json!({"What is your name?": "Jina lako ni nani?"}));
    let world = World::with_config(config);
    world
        .storage
        .insert(KEY, json!({"addr": ADDR, "lang": "sw", "state": {"name": "ask_name"}}));

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "resume"))
        .await
        .unwrap();

    assert_eq!(world.outbound.replies()[0].content, "Jina lako ni nani?");
    assert_eq!(world.stored()["lang"], json!("sw"));
}

#[tokio::test]
async fn default_language_applies_to_new_sessions() {
    let config = StaticConfig::new()
        .with("config", json!({"name": "hello", "default_lang": "sw"}))
        .with("translation.sw", json!({"What is your name?": ["", "Jina lako ni nani?"]}));
    let world = World::with_config(config);

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "new"))
        .await
        .unwrap();

    assert_eq!(world.outbound.replies()[0].content, "Jina lako ni nani?");
}

#[tokio::test]
async fn user_store_overrides_key_namespace() {
    let config = StaticConfig::new().with("config", json!({"name": "hello", "user_store": "shared"}));
    let world = World::with_config(config);

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "new"))
        .await
        .unwrap();

    assert_eq!(
        world.storage.writes(),
        vec![format!("users.shared.{ADDR}")]
    );
}

fn multilingual_app() -> App {
    AppBuilder::new()
        .start_state("lang")
        .state("lang", |name| {
            LanguageChoice::new(
                name,
                "Choose your language:",
                [Choice::new("en", "English"), Choice::new("sw", "Kiswahili")],
            )
            .next("main")
        })
        .unwrap()
        .state("main", |name| {
            MenuState::new(
                name,
                "Main menu",
                [Choice::new("bye", "Leave"), Choice::new("lang", "Language")],
            )
        })
        .unwrap()
        .state("bye", |name| EndState::new(name, "Goodbye!"))
        .unwrap()
        .build()
        .unwrap()
}

#[tokio::test]
async fn language_choice_translates_following_states() {
    let config = StaticConfig::for_app("hello").with(
        "translation.sw",
        json!({"Main menu": "Menyu kuu", "Leave": "Ondoka", "Language": "Lugha", "Goodbye!": "Kwaheri!"}),
    );
    let world = World {
        app: Arc::new(multilingual_app()),
        ..World::with_config(config)
    };
    world.store_state("lang");

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "resume").with_content("2"))
        .await
        .unwrap();

    assert_eq!(
        world.outbound.replies()[0].content,
        "Menyu kuu\n1. Ondoka\n2. Lugha"
    );
    assert_eq!(world.stored()["lang"], json!("sw"));
    assert_eq!(world.stored()["state"]["name"], json!("main"));
    assert_eq!(world.stored()["answers"]["lang"], json!("sw"));

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "resume").with_content("1"))
        .await
        .unwrap();

    let replies = world.outbound.replies();
    assert_eq!(replies[1].content, "Kwaheri!");
    assert!(!replies[1].continue_session);
    assert_eq!(world.stored()["state"]["name"], json!("bye"));
}

#[tokio::test]
async fn invalid_menu_choice_shows_error() {
    let world = World {
        app: Arc::new(multilingual_app()),
        ..World::new()
    };
    world.store_state("main");

    world
        .controller()
        .handle_message(InboundMessage::new(ADDR, "resume").with_content("7"))
        .await
        .unwrap();

    assert_eq!(
        world.outbound.replies()[0].content,
        "Invalid choice.\nMain menu\n1. Leave\n2. Language"
    );
    assert_eq!(world.stored()["state"]["name"], json!("main"));
    assert_eq!(world.stored()["lang"], Value::Null);
}
