//! Collaborators implemented as sandbox commands over a [`Transport`].

use super::traits::{ApiError, ConfigSource, Outbound, Storage, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Storage, outbound and config access through sandbox commands
/// (`kv.*`, `outbound.*`, `config.get`).
pub struct SandboxApi {
    transport: Arc<dyn Transport>,
}

impl SandboxApi {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send a command and reject replies that do not report success.
    pub async fn request(&self, command: &str, payload: Value) -> Result<Value, ApiError> {
        let reply = self.transport.request(command, payload).await?;
        check_reply(command, reply)
    }
}

/// Turn a `success: false` reply into an [`ApiError`].
pub fn check_reply(command: &str, reply: Value) -> Result<Value, ApiError> {
    match reply.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(reply),
        Some(false) => Err(ApiError::Failed {
            command: command.to_string(),
            reason: reply
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown reason")
                .to_string(),
        }),
        None => Err(ApiError::MalformedReply {
            command: command.to_string(),
            reason: "missing 'success' flag".to_string(),
        }),
    }
}

fn reply_value(reply: &Value) -> Option<Value> {
    match reply.get("value") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.clone()),
    }
}

#[async_trait]
impl Storage for SandboxApi {
    async fn get(&self, key: &str) -> Result<Option<Value>, ApiError> {
        let reply = self.request("kv.get", json!({ "key": key })).await?;
        Ok(reply_value(&reply))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), ApiError> {
        self.request("kv.set", json!({ "key": key, "value": value }))
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl Outbound for SandboxApi {
    async fn reply_to(
        &self,
        content: &str,
        in_reply_to: &str,
        continue_session: bool,
    ) -> Result<(), ApiError> {
        self.request(
            "outbound.reply_to",
            json!({
                "content": content,
                "in_reply_to": in_reply_to,
                "continue_session": continue_session,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn send_to(
        &self,
        to_addr: &str,
        content: &str,
        delivery_class: &str,
    ) -> Result<(), ApiError> {
        self.request(
            "outbound.send_to",
            json!({
                "to_addr": to_addr,
                "content": content,
                "delivery_class": delivery_class,
            }),
        )
        .await
        .map(|_| ())
    }
}

#[async_trait]
impl ConfigSource for SandboxApi {
    async fn get(&self, key: &str, json: bool) -> Result<Option<Value>, ApiError> {
        let reply = self.request("config.get", json!({ "key": key })).await?;
        let Some(value) = reply_value(&reply) else {
            return Ok(None);
        };

        match (json, value) {
            (true, Value::String(raw)) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ApiError::MalformedReply {
                    command: "config.get".to_string(),
                    reason: format!("value for '{key}' is not JSON: {e}"),
                }),
            (_, value) => Ok(Some(value)),
        }
    }
}
