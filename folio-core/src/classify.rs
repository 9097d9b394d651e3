//! Shape detection for index and tab config files.

use crate::lang::{normalize, LanguageCode, DEFAULT_BUCKET};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt;

/// Item keys that carry metadata shared by every language of an item.
pub const ITEM_META_KEYS: [&str; 5] = ["tag", "tags", "image", "date", "excerpt"];

/// Keys of a single-language (legacy flat) item.
const FLAT_KEYS: [&str; 2] = ["location", "title"];

/// Config shapes understood by the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigFormat {
    /// Language buckets hold inline `{title, location, excerpt}` objects.
    Unified,
    /// Language buckets hold markdown paths enriched from front matter.
    Simplified,
    /// One language, a bare `location` per item.
    LegacyFlat,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Unified => "unified",
            ConfigFormat::Simplified => "simplified",
            ConfigFormat::LegacyFlat => "legacy-flat",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `key` names a language bucket rather than item metadata.
pub fn is_language_key(key: &str) -> bool {
    !ITEM_META_KEYS.contains(&key) && !FLAT_KEYS.contains(&key)
}

/// Classify a parsed config, defaulting to [`ConfigFormat::LegacyFlat`].
pub fn classify(raw: &Value) -> ConfigFormat {
    classify_decisive(raw).unwrap_or(ConfigFormat::LegacyFlat)
}

/// Classify a parsed config from its first decisive item.
///
/// Returns `None` when no item has a recognizable shape (including when
/// the config is not a mapping at all); the assembler then falls back to
/// per-language sibling files.
pub fn classify_decisive(raw: &Value) -> Option<ConfigFormat> {
    let items = raw.as_mapping()?;
    items
        .values()
        .filter_map(Value::as_mapping)
        .find_map(classify_item)
}

/// Shape of one item node, or `None` when it is not decisive.
pub fn classify_item(node: &Mapping) -> Option<ConfigFormat> {
    let buckets: Vec<&Value> = node
        .iter()
        .filter(|(k, _)| k.as_str().is_some_and(is_language_key))
        .map(|(_, v)| v)
        .collect();

    if !buckets.is_empty() && buckets.iter().all(|v| is_path_value(v)) {
        return Some(ConfigFormat::Simplified);
    }

    let has_default = node.contains_key(DEFAULT_BUCKET);
    let has_unknown_key = node.keys().any(|k| match k.as_str() {
        Some(key) => key != "location" && !ITEM_META_KEYS.contains(&key),
        None => true,
    });
    if has_default || (has_unknown_key && !buckets.is_empty()) {
        return Some(ConfigFormat::Unified);
    }

    if node.contains_key("location") {
        return Some(ConfigFormat::LegacyFlat);
    }
    None
}

/// A markdown path or a list of markdown paths.
fn is_path_value(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Sequence(items) => items.iter().all(Value::is_string),
        _ => false,
    }
}

/// Normalized language codes declared across all items, first seen first.
pub fn available_languages(raw: &Value) -> Vec<LanguageCode> {
    let mut langs: Vec<LanguageCode> = Vec::new();
    let Some(items) = raw.as_mapping() else {
        return langs;
    };

    for node in items.values().filter_map(Value::as_mapping) {
        for key in node.keys().filter_map(Value::as_str) {
            if !is_language_key(key) || key == DEFAULT_BUCKET {
                continue;
            }
            let code = normalize(key);
            if !langs.contains(&code) {
                langs.push(code);
            }
        }
    }
    langs
}
