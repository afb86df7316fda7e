//! Sandbox and application configuration.
//!
//! The controller reads configuration in two layers: the raw sandbox
//! config (a key lookup over the [`ConfigSource`] collaborator) and the
//! application config stored as JSON under the sandbox key `config`.

use crate::error::Result;
use crate::events::Emitter;
use crate::resources::ConfigSource;
use serde_json::{Map, Value};
use std::sync::Arc;
use stillwater::validation::Validation;
use thiserror::Error;

pub mod rules;

pub use rules::{ConfigViolation, RawImConfig};

/// Sandbox key holding the application config.
pub const CONFIG_KEY: &str = "config";

/// Errors raised while loading the application config. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config is malformed: {0}")]
    Malformed(String),

    #[error(
        "Invalid config: {}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Invalid(Vec<ConfigViolation>),
}

/// Options fixed when a controller is constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOptions {
    /// Metric store used when the config names neither a metric store nor
    /// an application.
    pub default_metric_store: String,

    /// Delivery class for messages sent with `send_to`.
    pub delivery_class: String,

    /// Content that discards the stored session and starts afresh.
    pub restart_keyword: String,

    /// Also forward controller log lines to the sandbox `log.info` command.
    pub forward_logs: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            default_metric_store: "default".to_string(),
            delivery_class: "ussd".to_string(),
            restart_keyword: "!restart".to_string(),
            forward_logs: false,
        }
    }
}

/// Validated application config.
#[derive(Clone, Debug, PartialEq)]
pub struct ImConfig {
    pub name: String,
    pub default_lang: Option<String>,
    pub user_store: Option<String>,
    pub metric_store: Option<String>,
    pub extra: Map<String, Value>,
}

impl ImConfig {
    /// Parse and validate a config value. An absent value is treated as an
    /// empty object, which then fails validation for its missing name.
    pub fn from_value(value: Option<Value>) -> std::result::Result<Self, ConfigError> {
        let value = value.unwrap_or_else(|| Value::Object(Map::new()));
        let raw: RawImConfig =
            serde_json::from_value(value).map_err(|e| ConfigError::Malformed(e.to_string()))?;

        match rules::validate(&raw) {
            Validation::Success(_) => Ok(Self {
                name: raw.name.unwrap_or_default(),
                default_lang: raw.default_lang,
                user_store: raw.user_store,
                metric_store: raw.metric_store,
                extra: raw.extra,
            }),
            Validation::Failure(errors) => Err(ConfigError::Invalid(errors.iter().cloned().collect())),
        }
    }

    /// Store namespace for session records.
    pub fn user_store(&self) -> &str {
        self.user_store.as_deref().unwrap_or(&self.name)
    }

    /// Store namespace for metrics.
    pub fn metric_store(&self) -> &str {
        self.metric_store.as_deref().unwrap_or(&self.name)
    }

    /// Application-specific config value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Reader over the sandbox's configuration resource.
pub struct SandboxConfig {
    source: Arc<dyn ConfigSource>,
    emitter: Emitter,
}

impl SandboxConfig {
    pub fn new(source: Arc<dyn ConfigSource>) -> Self {
        Self {
            source,
            emitter: Emitter::new("sandbox_config"),
        }
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub fn source(&self) -> &dyn ConfigSource {
        self.source.as_ref()
    }

    pub async fn setup(&self) -> Result<()> {
        self.emitter.emit_setup().await
    }

    pub async fn get(&self, key: &str, json: bool) -> Result<Option<Value>> {
        Ok(self.source.get(key, json).await?)
    }

    /// Load and validate the application config.
    pub async fn load_im_config(&self) -> Result<ImConfig> {
        let value = self.get(CONFIG_KEY, true).await?;
        Ok(ImConfig::from_value(value)?)
    }
}

impl std::fmt::Debug for SandboxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxConfig")
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}
