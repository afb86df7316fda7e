//! The per-message session controller.

use super::message::{InboundMessage, SessionEvent};
use crate::config::{ImConfig, SandboxConfig, SessionOptions};
use crate::core::{Metadata, State, StateContext};
use crate::error::{Error, Result};
use crate::events::{Emitter, Event};
use crate::registry::{App, CreatorContext};
use crate::resources::{check_reply, MetricStore, Resources};
use crate::session::{Session, UserOptions};
use serde_json::json;
use std::sync::Arc;

/// Drives one inbound message from setup to persistence.
///
/// Each invocation runs these steps strictly in order:
///
/// 1. setup: sandbox config, application config, metrics, session
/// 2. transition into the session's current state
/// 3. dispatch on the session event (`close`, `new`, anything else)
/// 4. reply from the state now current (skipped for `close`)
/// 5. persist the session
///
/// Any listener or collaborator failure aborts the remaining steps. The
/// controller then emits `im:error` and returns the original error.
pub struct SessionController {
    app: Arc<App>,
    resources: Resources,
    options: SessionOptions,
    emitter: Emitter,
    sandbox_config: SandboxConfig,
    config_emitter: Emitter,
    config: Option<ImConfig>,
    metrics: MetricStore,
    session: Session,
    state: Option<Box<dyn State>>,
}

impl SessionController {
    pub fn new(app: Arc<App>, resources: Resources, options: SessionOptions) -> Self {
        Self {
            sandbox_config: SandboxConfig::new(Arc::clone(&resources.config)),
            metrics: MetricStore::new(
                Arc::clone(&resources.transport),
                options.default_metric_store.clone(),
            ),
            app,
            resources,
            options,
            emitter: Emitter::new("controller"),
            config_emitter: Emitter::new("im_config"),
            config: None,
            session: Session::new(),
            state: None,
        }
    }

    /// The controller's own emitter. State lifecycle and session events
    /// are emitted here before they reach the state.
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Emits `setup` once the application config has loaded.
    pub fn config_emitter(&self) -> &Emitter {
        &self.config_emitter
    }

    pub fn sandbox_config(&self) -> &SandboxConfig {
        &self.sandbox_config
    }

    pub fn metrics(&self) -> &MetricStore {
        &self.metrics
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// The application config, once loaded.
    pub fn im_config(&self) -> Option<&ImConfig> {
        self.config.as_ref()
    }

    pub fn state(&self) -> Option<&dyn State> {
        self.state.as_deref()
    }

    /// With `None`, whether any state is active; otherwise whether the
    /// named state is.
    pub fn is_in_state(&self, name: Option<&str>) -> bool {
        match (&self.state, name) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(state), Some(name)) => state.name() == name,
        }
    }

    /// Handle one inbound message through persistence.
    pub async fn handle_message(&mut self, msg: InboundMessage) -> Result<()> {
        match self.run(msg).await {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::error!(error = %err, "Invocation failed");
                let event = Event::Error {
                    message: err.to_string(),
                };
                if let Err(emit_err) = self.emitter.emit(event).await {
                    tracing::warn!(error = %emit_err, "im:error listener failed");
                }
                Err(err)
            }
        }
    }

    async fn run(&mut self, mut msg: InboundMessage) -> Result<()> {
        self.state = None;

        let restart = msg.content.as_deref() == Some(self.options.restart_keyword.as_str());
        if restart {
            msg.content = None;
        }

        self.setup(&msg.from_addr, restart).await?;
        self.switch_to_user_state().await?;

        self.log(&format!(
            "Received inbound message ({}): {}",
            msg.session_event,
            msg.content.as_deref().unwrap_or("<no content>")
        ))
        .await?;

        let state_name = self.state.as_ref().map(|s| s.name().to_string());
        self.log(&format!(
            "Switched to state: {}",
            state_name.as_deref().unwrap_or("<none>")
        ))
        .await?;

        match msg.session_event {
            SessionEvent::Close => self.handle_close().await?,
            SessionEvent::New => self.handle_new(&msg).await?,
            SessionEvent::Resume | SessionEvent::Other(_) => self.handle_resume(&msg).await?,
        }

        self.log(&format!("Saving session for {}", self.session.addr()))
            .await?;
        self.session.save(self.resources.storage.as_ref()).await?;
        self.emitter.emit_teardown().await
    }

    async fn setup(&mut self, addr: &str, restart: bool) -> Result<()> {
        self.sandbox_config.setup().await?;

        let config = self.sandbox_config.load_im_config().await?;
        self.config_emitter.emit_setup().await?;

        self.metrics.setup(config.metric_store()).await?;

        let opts = UserOptions {
            lang: config.default_lang.clone(),
            store_name: Some(config.user_store().to_string()),
        };
        self.config = Some(config);

        let storage = self.resources.storage.as_ref();
        let source = self.resources.config.as_ref();
        if restart {
            tracing::info!(addr = %addr, "Restarting session");
            self.session.reset(addr, opts, source).await
        } else {
            self.session.load_or_create(addr, opts, storage, source).await
        }
    }

    async fn switch_to_user_state(&mut self) -> Result<()> {
        let record = self.session.state();
        let name = record.name().map(str::to_string);
        let metadata = record.metadata().clone();
        let creator_opts = record.creator_opts().clone();
        self.switch_state(name, metadata, creator_opts).await
    }

    /// Move to `target` unless it is already active.
    ///
    /// A `None` target resolves to the start state when nothing is active,
    /// and keeps the active state otherwise.
    async fn switch_state(
        &mut self,
        target: Option<String>,
        metadata: Metadata,
        creator_opts: Metadata,
    ) -> Result<()> {
        if let Some(current) = &self.state {
            match target.as_deref() {
                None => return Ok(()),
                Some(name) if name == current.name() => return Ok(()),
                Some(_) => {}
            }
        }

        let config = self.config.as_ref().ok_or(Error::NotSetUp)?;
        let ctx = CreatorContext {
            creator_opts: creator_opts.clone(),
            config: config.clone(),
            lang: self.session.lang().map(str::to_string),
        };
        let mut state = self.app.resolve(target.as_deref(), ctx).await;

        let mut state_ctx = StateContext {
            session: &mut self.session,
            config,
            metadata: &metadata,
            config_source: self.resources.config.as_ref(),
        };
        state.setup(&mut state_ctx).await?;
        state.emitter().emit_setup().await?;

        self.emit_state_exit().await?;

        let persisted = state.persisted_name().map(str::to_string);
        let entered = Event::StateEnter {
            state: state.name().to_string(),
        };
        self.session
            .state_mut()
            .activate(persisted, metadata, creator_opts);
        let state = self.state.insert(state);

        self.emitter.emit(entered.clone()).await?;
        state.emitter().emit(entered).await
    }

    async fn emit_state_exit(&self) -> Result<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        let event = Event::StateExit {
            state: state.name().to_string(),
        };
        self.emitter.emit(event.clone()).await?;
        state.emitter().emit(event).await
    }

    async fn handle_close(&mut self) -> Result<()> {
        self.emitter
            .emit(Event::SessionClose {
                user_terminated: true,
            })
            .await
    }

    async fn handle_new(&mut self, msg: &InboundMessage) -> Result<()> {
        self.emitter.emit(Event::SessionNew).await?;
        let state = self.state.as_ref().ok_or(Error::NoActiveState)?;
        state.emitter().emit(Event::SessionNew).await?;
        self.reply(msg).await
    }

    async fn handle_resume(&mut self, msg: &InboundMessage) -> Result<()> {
        self.emitter.emit(Event::SessionResume).await?;

        if let Some(content) = msg.content.as_deref() {
            self.dispatch_input(content).await?;
        }

        self.reply(msg).await
    }

    async fn dispatch_input(&mut self, content: &str) -> Result<()> {
        let state = self.state.as_mut().ok_or(Error::NoActiveState)?;
        let event = Event::StateInput {
            state: state.name().to_string(),
            content: content.to_string(),
        };
        self.emitter.emit(event.clone()).await?;
        state.emitter().emit(event).await?;

        let config = self.config.as_ref().ok_or(Error::NotSetUp)?;
        let metadata = self.session.state().metadata().clone();
        let mut ctx = StateContext {
            session: &mut self.session,
            config,
            metadata: &metadata,
            config_source: self.resources.config.as_ref(),
        };
        let next = state.input(&mut ctx, content).await?;

        if self.session.state().name() != next.as_deref() {
            self.session.state_mut().reset(next);
        }
        self.switch_to_user_state().await
    }

    async fn reply(&mut self, msg: &InboundMessage) -> Result<()> {
        self.switch_to_user_state().await?;

        let state = self.state.as_mut().ok_or(Error::NoActiveState)?;
        let continue_session = state.continue_session();
        if !continue_session {
            self.emitter
                .emit(Event::SessionClose {
                    user_terminated: false,
                })
                .await?;
        }

        if !state.send_reply() {
            return Ok(());
        }

        state.translate(self.session.translator());
        let content = state.display();
        self.resources
            .outbound
            .reply_to(&content, &msg.message_id, continue_session)
            .await?;
        Ok(())
    }

    /// Log a line, forwarding it to the sandbox `log.info` command when
    /// `forward_logs` is set.
    pub async fn log(&self, message: &str) -> Result<()> {
        tracing::info!(addr = %self.session.addr(), "{message}");
        if !self.options.forward_logs {
            return Ok(());
        }
        let reply = self
            .resources
            .transport
            .request("log.info", json!({ "msg": message }))
            .await?;
        check_reply("log.info", reply)?;
        Ok(())
    }

    /// Send a message outside the reply, using the configured delivery
    /// class.
    pub async fn send_to(&self, to_addr: &str, content: &str) -> Result<()> {
        self.resources
            .outbound
            .send_to(to_addr, content, &self.options.delivery_class)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("app", &self.app)
            .field("options", &self.options)
            .field("session", &self.session)
            .field("state", &self.state.as_ref().map(|s| s.name().to_string()))
            .finish_non_exhaustive()
    }
}
