//! The user's position in the dialogue graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form JSON object attached to states and sessions.
pub type Metadata = Map<String, Value>;

/// Where a session currently is in the state machine.
///
/// A record is either plain data restored from storage (`Pending`) or bound
/// to the state instance the controller has just entered (`Active`). Both
/// expose the same accessors, and both persist the same way. An absent name
/// means "no current state", which is distinct from every concrete state
/// name, including the error state's.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord", into = "StoredRecord")]
pub enum StateRecord {
    Pending {
        name: Option<String>,
        metadata: Metadata,
        creator_opts: Metadata,
    },
    Active {
        name: Option<String>,
        metadata: Metadata,
        creator_opts: Metadata,
    },
}

impl Default for StateRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl StateRecord {
    /// A record with no current state.
    pub fn new() -> Self {
        Self::Pending {
            name: None,
            metadata: Metadata::new(),
            creator_opts: Metadata::new(),
        }
    }

    /// A pending record naming `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Pending {
            name: Some(name.into()),
            metadata: Metadata::new(),
            creator_opts: Metadata::new(),
        }
    }

    /// Bind the record to a freshly entered state. `name` is the name that
    /// state persists as, which is absent for the error state.
    pub fn activate(&mut self, name: Option<String>, metadata: Metadata, creator_opts: Metadata) {
        *self = Self::Active {
            name,
            metadata,
            creator_opts,
        };
    }

    /// Point the record at a new state name, clearing metadata and creator
    /// options.
    pub fn reset(&mut self, name: Option<String>) {
        *self = Self::Pending {
            name,
            metadata: Metadata::new(),
            creator_opts: Metadata::new(),
        };
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Pending { name, .. } | Self::Active { name, .. } => name.as_deref(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Self::Pending { metadata, .. } | Self::Active { metadata, .. } => metadata,
        }
    }

    pub fn creator_opts(&self) -> &Metadata {
        match self {
            Self::Pending { creator_opts, .. } | Self::Active { creator_opts, .. } => creator_opts,
        }
    }

    /// Merge `update` into the metadata, overwriting keys it shares.
    pub fn update_metadata(&mut self, update: Metadata) {
        let metadata = match self {
            Self::Pending { metadata, .. } | Self::Active { metadata, .. } => metadata,
        };
        metadata.extend(update);
    }

    /// Whether the record names any state.
    pub fn exists(&self) -> bool {
        self.name().is_some()
    }

    /// Whether the record names `state_name`.
    pub fn is(&self, state_name: &str) -> bool {
        self.name() == Some(state_name)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

// Persisted shape. Missing or null maps load as empty maps.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoredRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    creator_opts: Option<Metadata>,
}

impl From<StoredRecord> for StateRecord {
    fn from(stored: StoredRecord) -> Self {
        Self::Pending {
            name: stored.name,
            metadata: stored.metadata.unwrap_or_default(),
            creator_opts: stored.creator_opts.unwrap_or_default(),
        }
    }
}

impl From<StateRecord> for StoredRecord {
    fn from(record: StateRecord) -> Self {
        match record {
            StateRecord::Pending {
                name,
                metadata,
                creator_opts,
            }
            | StateRecord::Active {
                name,
                metadata,
                creator_opts,
            } => Self {
                name,
                metadata: Some(metadata),
                creator_opts: Some(creator_opts),
            },
        }
    }
}
