//! External collaborators: transport, storage, outbound messaging,
//! configuration, translation and metrics.

mod metrics;
mod sandbox;
mod traits;
mod translate;

pub use metrics::{Aggregation, MetricStore};
pub use sandbox::{check_reply, SandboxApi};
pub use traits::{ApiError, ConfigSource, Outbound, Resources, Storage, Transport};
pub use translate::Translator;
