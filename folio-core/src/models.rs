//! Content model structs for resolved posts and tabs.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Metadata projected from one markdown file's front matter.
///
/// Instances held by the fetch cache are shared behind `Arc` and never
/// mutated after insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatterRecord {
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Title hint; folded into [`ContentEntry::title`] and dropped from versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl FrontMatterRecord {
    /// Minimal record used when a fetch fails or nothing is known yet.
    pub fn stub(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_date)
    }
}

/// A resolved post, keyed by its title in a [`ResultMap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    pub title: String,
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Every variant of the post, newest first.
    pub versions: Vec<FrontMatterRecord>,
}

impl ContentEntry {
    pub fn is_draft(&self) -> bool {
        self.draft.unwrap_or(false)
    }

    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_date)
    }

    /// Fill fields the entry lacks from item-level metadata.
    pub fn inherit(&mut self, meta: &ItemMeta) {
        if self.tag.is_empty() {
            self.tag = meta.tag.clone();
        }
        if self.image.is_none() {
            self.image = meta.image.clone();
        }
        if self.date.is_none() {
            self.date = meta.date.clone();
        }
        if self.excerpt.is_none() {
            self.excerpt = meta.excerpt.clone();
        }
    }
}

/// Item-level metadata shared across all language buckets of one item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemMeta {
    pub tag: Vec<String>,
    pub image: Option<String>,
    pub date: Option<String>,
    pub excerpt: Option<String>,
}

/// A navigation tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabEntry {
    pub title: String,
    pub location: String,
    pub slug: String,
}

/// Resolved posts keyed by title.
pub type ResultMap = BTreeMap<String, ContentEntry>;

/// Resolved tabs keyed by title.
pub type TabMap = BTreeMap<String, TabEntry>;

/// Newest entries first; undated entries last, ties by title.
pub fn entries_by_date(map: &ResultMap) -> Vec<&ContentEntry> {
    let mut entries: Vec<&ContentEntry> = map.values().collect();
    entries.sort_by(|a, b| newest_first(a.parsed_date(), b.parsed_date()));
    entries
}

/// Entries not marked as drafts.
pub fn published(map: &ResultMap) -> ResultMap {
    map.iter()
        .filter(|(_, entry)| !entry.is_draft())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Tag usage counts across all entries.
pub fn tag_counts(map: &ResultMap) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tag in map.values().flat_map(|e| e.tag.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}

/// Descending date order with missing dates treated as the oldest.
pub fn newest_first(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse the date spellings found in front matter and index files.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}
