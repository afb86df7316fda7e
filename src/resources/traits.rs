//! Capabilities the controller consumes.
//!
//! These traits let hosts plug in their own transport and storage, and let
//! tests run the controller against in-memory doubles.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Failures reported by collaborators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    /// The remote side answered with `success: false`.
    #[error("Request '{command}' failed: {reason}")]
    Failed { command: String, reason: String },

    /// The reply could not be interpreted.
    #[error("Malformed reply to '{command}': {reason}")]
    MalformedReply { command: String, reason: String },

    /// The collaborator could not be reached at all.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Opaque request/reply exchange with the host sandbox.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `command` with `payload` and return the raw reply.
    async fn request(&self, command: &str, payload: Value) -> Result<Value, ApiError>;
}

/// Key/value persistence for session records.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Value>, ApiError>;

    /// Store `value` under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<(), ApiError>;
}

/// Outbound messaging.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Reply to the inbound message identified by `in_reply_to`.
    async fn reply_to(
        &self,
        content: &str,
        in_reply_to: &str,
        continue_session: bool,
    ) -> Result<(), ApiError>;

    /// Send a message that is not a reply.
    async fn send_to(
        &self,
        to_addr: &str,
        content: &str,
        delivery_class: &str,
    ) -> Result<(), ApiError>;
}

/// Configuration and translation lookups.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Fetch the value under `key`. When `json` is set, string values are
    /// parsed as JSON. Absent keys resolve to `None`.
    async fn get(&self, key: &str, json: bool) -> Result<Option<Value>, ApiError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn request(&self, command: &str, payload: Value) -> Result<Value, ApiError> {
        (**self).request(command, payload).await
    }
}

#[async_trait]
impl<T: Storage + ?Sized> Storage for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<Value>, ApiError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), ApiError> {
        (**self).set(key, value).await
    }
}

#[async_trait]
impl<T: Outbound + ?Sized> Outbound for Arc<T> {
    async fn reply_to(
        &self,
        content: &str,
        in_reply_to: &str,
        continue_session: bool,
    ) -> Result<(), ApiError> {
        (**self)
            .reply_to(content, in_reply_to, continue_session)
            .await
    }

    async fn send_to(
        &self,
        to_addr: &str,
        content: &str,
        delivery_class: &str,
    ) -> Result<(), ApiError> {
        (**self).send_to(to_addr, content, delivery_class).await
    }
}

#[async_trait]
impl<T: ConfigSource + ?Sized> ConfigSource for Arc<T> {
    async fn get(&self, key: &str, json: bool) -> Result<Option<Value>, ApiError> {
        (**self).get(key, json).await
    }
}

/// The full set of collaborators one controller talks to.
#[derive(Clone)]
pub struct Resources {
    pub transport: Arc<dyn Transport>,
    pub storage: Arc<dyn Storage>,
    pub outbound: Arc<dyn Outbound>,
    pub config: Arc<dyn ConfigSource>,
}

impl Resources {
    /// Route every capability through a single sandbox transport.
    pub fn sandbox(transport: Arc<dyn Transport>) -> Self {
        let api = Arc::new(super::sandbox::SandboxApi::new(Arc::clone(&transport)));
        Self {
            transport,
            storage: api.clone(),
            outbound: api.clone(),
            config: api,
        }
    }
}

impl std::fmt::Debug for Resources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resources").finish_non_exhaustive()
    }
}
