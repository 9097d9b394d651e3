//! Front matter parsing from markdown files.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Front matter is not a mapping")]
    NotAMapping,
}

static FRONTMATTER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\u{feff}?---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n(.*))?$")
        .expect("valid front matter regex")
});

/// A single flattened front matter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl FrontMatterValue {
    /// Text form of the value; lists yield their first element.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FrontMatterValue::Text(s) => Some(s.as_str()),
            FrontMatterValue::List(items) => items.first().map(String::as_str),
            FrontMatterValue::Flag(_) => None,
        }
    }

    /// All values as a list of strings.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            FrontMatterValue::Text(s) => vec![s.clone()],
            FrontMatterValue::List(items) => items.clone(),
            FrontMatterValue::Flag(b) => vec![b.to_string()],
        }
    }
}

/// Result of splitting a markdown file into front matter and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub front_matter: BTreeMap<String, FrontMatterValue>,
    pub content: String,
}

impl ParsedDocument {
    pub fn get(&self, key: &str) -> Option<&FrontMatterValue> {
        self.front_matter.get(key)
    }

    /// Trimmed, non-empty text value for `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(FrontMatterValue::as_text)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Parse front matter from markdown content
///
/// Returns the flattened key/value block and the remaining body. Content
/// without a leading `---` block yields an empty map and the full text.
///
/// # Example
///
/// ```
/// use folio_core::frontmatter::{parse_front_matter, FrontMatterValue};
///
/// let content = "---\ntitle: My Post\ndate: 2025-01-01\n---\n# Hello World\n";
///
/// let doc = parse_front_matter(content).unwrap();
/// assert_eq!(doc.text("title").as_deref(), Some("My Post"));
/// assert_eq!(doc.get("date"), Some(&FrontMatterValue::Text("2025-01-01".into())));
/// assert!(doc.content.trim().starts_with("# Hello World"));
/// ```
pub fn parse_front_matter(content: &str) -> Result<ParsedDocument, FrontmatterError> {
    let Some(captures) = FRONTMATTER_REGEX.captures(content) else {
        return Ok(ParsedDocument {
            front_matter: BTreeMap::new(),
            content: content.to_string(),
        });
    };

    let yaml = captures.get(1).map_or("", |m| m.as_str());
    let body = captures.get(2).map_or("", |m| m.as_str());

    let front_matter = match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => BTreeMap::new(),
        Value::Mapping(map) => map
            .into_iter()
            .filter_map(|(k, v)| Some((scalar_text(&k)?, flatten(v)?)))
            .collect(),
        _ => return Err(FrontmatterError::NotAMapping),
    };

    Ok(ParsedDocument {
        front_matter,
        content: body.to_string(),
    })
}

/// Like [`parse_front_matter`], but a malformed block degrades to an empty
/// map with the original text as body.
pub fn extract_front_matter(content: &str) -> ParsedDocument {
    parse_front_matter(content).unwrap_or_else(|err| {
        tracing::debug!("Ignoring malformed front matter: {}", err);
        ParsedDocument {
            front_matter: BTreeMap::new(),
            content: content.to_string(),
        }
    })
}

fn flatten(value: Value) -> Option<FrontMatterValue> {
    match value {
        Value::Bool(b) => Some(FrontMatterValue::Flag(b)),
        Value::Sequence(items) => Some(FrontMatterValue::List(
            items.iter().filter_map(scalar_text).collect(),
        )),
        Value::Tagged(tagged) => flatten(tagged.value),
        other => scalar_text(&other).map(FrontMatterValue::Text),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
