//! Per-language message catalogues.

use super::traits::{ApiError, ConfigSource};
use serde_json::Value;
use std::collections::HashMap;

/// Looks up translated copy for one language.
///
/// Catalogues are JSON objects mapping a message id either to its
/// translation or to an array whose last string element is the translation
/// (the layout gettext-to-JSON converters emit). Unknown ids translate to
/// themselves.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Translator {
    lang: Option<String>,
    messages: HashMap<String, String>,
}

impl Translator {
    /// A translator that returns every message unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Build a translator from a catalogue value.
    pub fn from_catalogue(lang: impl Into<String>, catalogue: &Value) -> Self {
        let messages = catalogue
            .as_object()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(msgid, _)| !msgid.is_empty())
                    .filter_map(|(msgid, entry)| {
                        translation_of(entry).map(|text| (msgid.clone(), text))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            lang: Some(lang.into()),
            messages,
        }
    }

    /// Fetch the catalogue for `lang` from the config key
    /// `translation.<lang>`. A missing catalogue yields an identity
    /// translator tagged with the language.
    pub async fn fetch(config: &dyn ConfigSource, lang: &str) -> Result<Self, ApiError> {
        let catalogue = config.get(&format!("translation.{lang}"), true).await?;
        Ok(match catalogue {
            Some(catalogue) => Self::from_catalogue(lang, &catalogue),
            None => Self {
                lang: Some(lang.to_string()),
                messages: HashMap::new(),
            },
        })
    }

    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    /// Translate `msgid`, falling back to the id itself.
    pub fn gettext(&self, msgid: &str) -> String {
        self.messages
            .get(msgid)
            .cloned()
            .unwrap_or_else(|| msgid.to_string())
    }
}

fn translation_of(entry: &Value) -> Option<String> {
    match entry {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => items
            .iter()
            .rev()
            .find_map(Value::as_str)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
