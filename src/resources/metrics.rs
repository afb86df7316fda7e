//! Metric firing into a per-application namespace.

use super::sandbox::check_reply;
use super::traits::{ApiError, Transport};
use crate::error::Result;
use crate::events::Emitter;
use serde_json::json;
use std::sync::Arc;

/// How the metrics backend combines fired values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// Fires metrics into one store through the transport.
pub struct MetricStore {
    transport: Arc<dyn Transport>,
    store_name: String,
    emitter: Emitter,
}

impl MetricStore {
    pub fn new(transport: Arc<dyn Transport>, store_name: impl Into<String>) -> Self {
        Self {
            transport,
            store_name: store_name.into(),
            emitter: Emitter::new("metrics"),
        }
    }

    /// Point the store at `store_name` and emit `setup`.
    pub async fn setup(&mut self, store_name: impl Into<String>) -> Result<()> {
        self.store_name = store_name.into();
        self.emitter.emit_setup().await
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    pub async fn fire(
        &self,
        metric: &str,
        value: f64,
        agg: Aggregation,
    ) -> std::result::Result<(), ApiError> {
        let reply = self
            .transport
            .request(
                "metrics.fire",
                json!({
                    "store": self.store_name,
                    "metric": metric,
                    "value": value,
                    "agg": agg.as_str(),
                }),
            )
            .await?;
        check_reply("metrics.fire", reply).map(|_| ())
    }

    pub async fn fire_sum(&self, metric: &str, value: f64) -> std::result::Result<(), ApiError> {
        self.fire(metric, value, Aggregation::Sum).await
    }

    pub async fn fire_avg(&self, metric: &str, value: f64) -> std::result::Result<(), ApiError> {
        self.fire(metric, value, Aggregation::Avg).await
    }

    pub async fn fire_min(&self, metric: &str, value: f64) -> std::result::Result<(), ApiError> {
        self.fire(metric, value, Aggregation::Min).await
    }

    pub async fn fire_max(&self, metric: &str, value: f64) -> std::result::Result<(), ApiError> {
        self.fire(metric, value, Aggregation::Max).await
    }

    /// Add one to a summed counter.
    pub async fn fire_inc(&self, metric: &str) -> std::result::Result<(), ApiError> {
        self.fire(metric, 1.0, Aggregation::Sum).await
    }
}

impl std::fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricStore")
            .field("store_name", &self.store_name)
            .finish_non_exhaustive()
    }
}
