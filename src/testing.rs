//! In-memory collaborators for tests.
//!
//! These doubles let applications exercise a controller end to end without
//! a sandbox. Each one records what it was asked to do.

use crate::resources::{ApiError, ConfigSource, Outbound, Storage, Transport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Storage
// ============================================================================

/// Key/value store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, Value>>,
    writes: Mutex<Vec<String>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording a write.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        lock(&self.values).insert(key.into(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        lock(&self.values).get(key).cloned()
    }

    /// Keys written through [`Storage::set`], in order.
    pub fn writes(&self) -> Vec<String> {
        lock(&self.writes).clone()
    }

    /// Make every later `set` fail.
    pub fn fail_writes(&self) {
        *lock(&self.fail_writes) = true;
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, ApiError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), ApiError> {
        if *lock(&self.fail_writes) {
            return Err(ApiError::Failed {
                command: "kv.set".to_string(),
                reason: "writes disabled".to_string(),
            });
        }
        lock(&self.writes).push(key.to_string());
        lock(&self.values).insert(key.to_string(), value);
        Ok(())
    }
}

// ============================================================================
// Outbound
// ============================================================================

/// A reply captured by [`RecordingOutbound`].
#[derive(Clone, Debug, PartialEq)]
pub struct SentReply {
    pub content: String,
    pub in_reply_to: String,
    pub continue_session: bool,
}

/// A non-reply message captured by [`RecordingOutbound`].
#[derive(Clone, Debug, PartialEq)]
pub struct SentMessage {
    pub to_addr: String,
    pub content: String,
    pub delivery_class: String,
}

/// Outbound collaborator that records instead of sending.
#[derive(Debug, Default)]
pub struct RecordingOutbound {
    replies: Mutex<Vec<SentReply>>,
    messages: Mutex<Vec<SentMessage>>,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replies(&self) -> Vec<SentReply> {
        lock(&self.replies).clone()
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        lock(&self.messages).clone()
    }
}

#[async_trait]
impl Outbound for RecordingOutbound {
    async fn reply_to(
        &self,
        content: &str,
        in_reply_to: &str,
        continue_session: bool,
    ) -> Result<(), ApiError> {
        lock(&self.replies).push(SentReply {
            content: content.to_string(),
            in_reply_to: in_reply_to.to_string(),
            continue_session,
        });
        Ok(())
    }

    async fn send_to(
        &self,
        to_addr: &str,
        content: &str,
        delivery_class: &str,
    ) -> Result<(), ApiError> {
        lock(&self.messages).push(SentMessage {
            to_addr: to_addr.to_string(),
            content: content.to_string(),
            delivery_class: delivery_class.to_string(),
        });
        Ok(())
    }
}

// ============================================================================
// Config
// ============================================================================

/// Config source serving fixed, already-parsed values.
#[derive(Debug, Default)]
pub struct StaticConfig {
    values: HashMap<String, Value>,
}

impl StaticConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value for `key`.
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    /// Config with an application config naming `app_name`.
    pub fn for_app(app_name: &str) -> Self {
        Self::new().with("config", json!({ "name": app_name }))
    }
}

#[async_trait]
impl ConfigSource for StaticConfig {
    async fn get(&self, key: &str, _json: bool) -> Result<Option<Value>, ApiError> {
        Ok(self.values.get(key).cloned())
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Transport answering each command with a scripted reply, defaulting to
/// `{"success": true}`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    replies: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every later `command` request with `reply`.
    pub fn reply_with(&self, command: impl Into<String>, reply: Value) {
        lock(&self.replies).insert(command.into(), reply);
    }

    /// Requests received so far as `(command, payload)` pairs.
    pub fn requests(&self) -> Vec<(String, Value)> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn request(&self, command: &str, payload: Value) -> Result<Value, ApiError> {
        lock(&self.requests).push((command.to_string(), payload));
        Ok(lock(&self.replies)
            .get(command)
            .cloned()
            .unwrap_or_else(|| json!({ "success": true })))
    }
}
