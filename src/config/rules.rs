//! Validation rules for the application config, using Validation to
//! accumulate every violation instead of stopping at the first.

use serde::Deserialize;
use serde_json::{Map, Value};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

/// A single problem found in the application config.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigViolation {
    #[error("'name' is required")]
    MissingName,

    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },
}

/// Config as read from the sandbox, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawImConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default_lang: Option<String>,
    #[serde(default)]
    pub user_store: Option<String>,
    #[serde(default)]
    pub metric_store: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

type Check = Validation<(), NonEmptyVec<ConfigViolation>>;

fn check_name(raw: &RawImConfig) -> Check {
    match raw.name.as_deref() {
        Some(name) if !name.trim().is_empty() => Validation::success(()),
        _ => Validation::fail(ConfigViolation::MissingName),
    }
}

fn check_optional(field: &'static str, value: &Option<String>) -> Check {
    match value.as_deref() {
        Some(v) if v.trim().is_empty() => Validation::fail(ConfigViolation::EmptyField { field }),
        _ => Validation::success(()),
    }
}

/// Run every rule, returning all violations on failure.
pub fn validate(raw: &RawImConfig) -> Check {
    let checks = vec![
        check_name(raw),
        check_optional("default_lang", &raw.default_lang),
        check_optional("user_store", &raw.user_store),
        check_optional("metric_store", &raw.metric_store),
    ];

    Validation::all_vec(checks).map(|_| ())
}
