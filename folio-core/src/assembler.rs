//! Resolving a site's index and tab configs into result maps.
//!
//! Flow per config file:
//!
//! ```text
//! {base}.yaml ──classify──┬─ unified ────► inline buckets ───────────► ResultMap
//!       │                 ├─ simplified ─► cached records ─► eager ResultMap
//!       │                 │                    └─ fetch queue ─► EnrichmentEvent
//!       │                 └─ legacy-flat ─► items as-is ─────────────► ResultMap
//!       └─ not recognized ─► {base}.{lang}.yaml ─► {base}.{default}.yaml ─► legacy
//! ```

use crate::builder::build_entry;
use crate::classify::{available_languages, classify, classify_decisive, is_language_key, ConfigFormat};
use crate::config::{Config, ConfigError};
use crate::events::{EnrichmentEvent, EnrichmentEvents, EnrichmentHandle};
use crate::lang::{normalize, select_bucket, LanguageCode};
use crate::models::{ContentEntry, FrontMatterRecord, ItemMeta, ResultMap, TabEntry, TabMap};
use crate::queue::FetchQueue;
use crate::slug::slugify;
use crate::source::{join_path, ContentSource};
use futures::future::{self, BoxFuture};
use serde_yaml::{Mapping, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one [`ContentAssembler::load`] call.
#[derive(Debug)]
pub struct ContentLoad {
    pub load_id: u64,
    pub lang: LanguageCode,
    /// Shape the entries were read from; `None` when no config loaded.
    pub format: Option<ConfigFormat>,
    /// The eager result map, usable immediately.
    pub entries: ResultMap,
    /// Present when some front matter still had to be fetched.
    pub enrichment: Option<EnrichmentHandle>,
}

impl ContentLoad {
    fn ready(load_id: u64, lang: LanguageCode, format: Option<ConfigFormat>, entries: ResultMap) -> Self {
        Self {
            load_id,
            lang,
            format,
            entries,
            enrichment: None,
        }
    }

    /// The corrected map once enrichment settles, or the eager map.
    pub async fn into_settled(self) -> ResultMap {
        match self.enrichment {
            Some(handle) => match handle.settled().await {
                Some(event) => event.entries,
                None => self.entries,
            },
            None => self.entries,
        }
    }
}

/// Resolves index and tab configs against a content source.
pub struct ContentAssembler {
    source: Arc<dyn ContentSource>,
    queue: FetchQueue,
    events: EnrichmentEvents,
    default_language: LanguageCode,
    next_load: AtomicU64,
}

/// One resolved item of a simplified config.
struct SimplifiedItem {
    slug: String,
    locations: Vec<String>,
    meta: ItemMeta,
}

impl ContentAssembler {
    pub fn new(
        source: Arc<dyn ContentSource>,
        queue: FetchQueue,
        events: EnrichmentEvents,
        default_language: &str,
    ) -> Self {
        Self {
            source,
            queue,
            events,
            default_language: normalize(default_language),
            next_load: AtomicU64::new(1),
        }
    }

    /// Assembler with a fresh fetch queue rooted at the configured content root.
    pub fn from_config(config: &Config, source: Arc<dyn ContentSource>) -> Self {
        let queue = FetchQueue::new(
            Arc::clone(&source),
            config.content.root.clone(),
            config.content.fetch_concurrency,
        );
        Self::new(
            source,
            queue,
            EnrichmentEvents::default(),
            &config.default_language(),
        )
    }

    pub fn queue(&self) -> &FetchQueue {
        &self.queue
    }

    pub fn events(&self) -> &EnrichmentEvents {
        &self.events
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// First candidate file that loads and parses to a non-empty value.
    pub async fn fetch_config(&self, candidates: &[String]) -> Result<Value, ConfigError> {
        for path in candidates {
            let text = match self.source.fetch_text(path).await {
                Ok(text) => text,
                Err(err) => {
                    debug!("Config candidate {} unavailable: {}", path, err);
                    continue;
                }
            };
            match serde_yaml::from_str::<Value>(&text) {
                Ok(Value::Null) => debug!("Config candidate {} is empty", path),
                Ok(value) => return Ok(value),
                Err(err) => warn!("Config candidate {} is not valid YAML: {}", path, err),
            }
        }
        Err(ConfigError::Unavailable(candidates.join(", ")))
    }

    /// Resolve the posts index `{base_path}/{base_name}.yaml` for `lang`.
    ///
    /// Never fails: an unavailable config yields an empty map. Simplified
    /// configs return an eager map built from cached front matter and
    /// publish one [`EnrichmentEvent`] once the missing records settle.
    pub async fn load(&self, base_path: &str, base_name: &str, lang: &str) -> ContentLoad {
        let load_id = self.next_load.fetch_add(1, Ordering::Relaxed);
        let lang = normalize(lang);

        let Some((raw, format)) = self.resolve_config(base_path, base_name, &lang).await else {
            warn!("No config found for {}/{}", base_path, base_name);
            return ContentLoad::ready(load_id, lang, None, ResultMap::new());
        };

        let load = match format {
            ConfigFormat::Unified => {
                let entries = unified_entries(&raw, &lang, &self.default_language);
                ContentLoad::ready(load_id, lang, Some(format), entries)
            }
            ConfigFormat::LegacyFlat => {
                ContentLoad::ready(load_id, lang, Some(format), legacy_entries(&raw))
            }
            ConfigFormat::Simplified => self.load_simplified(load_id, lang, &raw),
        };

        info!(
            "Resolved {} entries from {} ({}, lang {})",
            load.entries.len(),
            base_name,
            format,
            load.lang
        );
        load
    }

    /// Resolve the tabs config `{base_path}/{base_name}.yaml` for `lang`.
    pub async fn load_tabs(&self, base_path: &str, base_name: &str, lang: &str) -> TabMap {
        let lang = normalize(lang);
        match self.resolve_config(base_path, base_name, &lang).await {
            Some((raw, format)) => tab_entries(&raw, format, &lang, &self.default_language),
            None => {
                warn!("No tabs config found for {}/{}", base_path, base_name);
                TabMap::new()
            }
        }
    }

    /// Languages declared by the unified/simplified config, if any.
    pub async fn available_languages(&self, base_path: &str, base_name: &str) -> Vec<LanguageCode> {
        match self.fetch_config(&candidates(base_path, base_name)).await {
            Ok(raw) if classify_decisive(&raw).is_some_and(|f| f != ConfigFormat::LegacyFlat) => {
                available_languages(&raw)
            }
            _ => Vec::new(),
        }
    }

    /// `{base}.yaml` when recognized, then `{base}.{lang}.yaml`,
    /// `{base}.{default}.yaml`, and finally `{base}.yaml` as legacy.
    async fn resolve_config(
        &self,
        base_path: &str,
        base_name: &str,
        lang: &str,
    ) -> Option<(Value, ConfigFormat)> {
        let primary = match self.fetch_config(&candidates(base_path, base_name)).await {
            Ok(raw) => match classify_decisive(&raw) {
                Some(format) => {
                    debug!("{} classified as {}", base_name, format);
                    return Some((raw, format));
                }
                None => {
                    debug!("{} has no recognizable items, trying language files", base_name);
                    Some(raw)
                }
            },
            Err(err) => {
                debug!("{}", err);
                None
            }
        };

        let mut tried: Vec<&str> = Vec::with_capacity(2);
        for code in [lang, self.default_language.as_str()] {
            if code.is_empty() || tried.contains(&code) {
                continue;
            }
            tried.push(code);
            let name = format!("{base_name}.{code}");
            if let Ok(raw) = self.fetch_config(&candidates(base_path, &name)).await {
                let format = classify(&raw);
                debug!("Falling back to {} ({})", name, format);
                return Some((raw, format));
            }
        }

        primary.map(|raw| (raw, ConfigFormat::LegacyFlat))
    }

    fn load_simplified(&self, load_id: u64, lang: LanguageCode, raw: &Value) -> ContentLoad {
        let mut entries = ResultMap::new();
        let mut resolved: Vec<SimplifiedItem> = Vec::new();
        let mut pending: Vec<BoxFuture<'static, Arc<FrontMatterRecord>>> = Vec::new();

        for (slug, node) in items(raw) {
            let Some((_, bucket)) =
                select_bucket(node, &lang, &self.default_language, |key, value| {
                    is_language_key(key) && !path_list(value).is_empty()
                })
            else {
                debug!("Skipping {}: no language bucket with a markdown path", slug);
                continue;
            };
            let item = SimplifiedItem {
                slug,
                locations: path_list(bucket),
                meta: item_meta(node),
            };

            let (variants, missing) = self.queue.snapshot(&item.locations);
            if let Some(entry) = item.entry(&variants) {
                entries.insert(entry.title.clone(), entry);
            }
            pending.extend(missing.iter().map(|loc| self.queue.request(loc)));
            resolved.push(item);
        }

        if pending.is_empty() {
            return ContentLoad::ready(load_id, lang, Some(ConfigFormat::Simplified), entries);
        }

        debug!(
            load_id,
            fetches = pending.len(),
            limit = ?self.queue.limit(),
            active = self.queue.active(),
            "Enriching entries in the background"
        );
        let queue = self.queue.clone();
        let events = self.events.clone();
        let event_lang = lang.clone();
        let task = tokio::spawn(async move {
            future::join_all(pending).await;

            let mut corrected = ResultMap::new();
            for item in &resolved {
                let (variants, _) = queue.snapshot(&item.locations);
                if let Some(entry) = item.entry(&variants) {
                    corrected.insert(entry.title.clone(), entry);
                }
            }

            let event = EnrichmentEvent {
                load_id,
                entries: corrected,
                lang: event_lang,
            };
            events.publish(event.clone());
            event
        });

        ContentLoad {
            load_id,
            lang,
            format: Some(ConfigFormat::Simplified),
            entries,
            enrichment: Some(EnrichmentHandle::new(task)),
        }
    }
}

impl SimplifiedItem {
    fn entry(&self, variants: &[Arc<FrontMatterRecord>]) -> Option<ContentEntry> {
        let mut entry = build_entry(variants, &self.slug)?;
        entry.inherit(&self.meta);
        Some(entry)
    }
}

fn candidates(base_path: &str, name: &str) -> Vec<String> {
    vec![
        join_path(base_path, &format!("{name}.yaml")),
        join_path(base_path, &format!("{name}.yml")),
    ]
}

/// Top-level items whose node is a mapping, in declaration order.
fn items<'a>(raw: &'a Value) -> impl Iterator<Item = (String, &'a Mapping)> + 'a {
    raw.as_mapping()
        .into_iter()
        .flat_map(|m| m.iter())
        .filter_map(|(key, node)| match (value_text(key), node.as_mapping()) {
            (Some(slug), Some(node)) => Some((slug, node)),
            (slug, _) => {
                debug!("Skipping unrecognized item {:?}", slug);
                None
            }
        })
}

/// Entries of a unified config, one language bucket per item.
pub fn unified_entries(raw: &Value, lang: &str, default_language: &str) -> ResultMap {
    let mut entries = ResultMap::new();
    for (slug, node) in items(raw) {
        let Some((_, bucket)) = select_bucket(node, lang, default_language, |key, value| {
            is_language_key(key) && bucket_location(value).is_some()
        }) else {
            debug!("Skipping {}: no language bucket with a location", slug);
            continue;
        };
        let record = match (bucket, bucket_location(bucket)) {
            (Value::Mapping(fields), Some(location)) => record_from_fields(location, fields),
            (_, location) => FrontMatterRecord::stub(location.unwrap_or_default()),
        };
        if let Some(mut entry) = build_entry(&[Arc::new(record)], &slug) {
            entry.inherit(&item_meta(node));
            entries.insert(entry.title.clone(), entry);
        }
    }
    entries
}

/// Entries of a single-language config; item keys are titles.
pub fn legacy_entries(raw: &Value) -> ResultMap {
    let mut entries = ResultMap::new();
    for (key, node) in items(raw) {
        let Some(location) = text_field(node, "location") else {
            debug!("Skipping {}: no location", key);
            continue;
        };
        let record = record_from_fields(location, node);
        if let Some(entry) = build_entry(&[Arc::new(record)], &key) {
            entries.insert(entry.title.clone(), entry);
        }
    }
    entries
}

/// Tabs of any config shape; tabs are not enriched from front matter.
pub fn tab_entries(raw: &Value, format: ConfigFormat, lang: &str, default_language: &str) -> TabMap {
    let mut tabs = TabMap::new();
    for (key, node) in items(raw) {
        let resolved = match format {
            ConfigFormat::LegacyFlat => {
                text_field(node, "location").map(|loc| (text_field(node, "title"), loc))
            }
            ConfigFormat::Unified | ConfigFormat::Simplified => select_bucket(
                node,
                lang,
                default_language,
                |key, value| is_language_key(key) && bucket_location(value).is_some(),
            )
            .and_then(|(_, bucket)| {
                let title = bucket.as_mapping().and_then(|fields| text_field(fields, "title"));
                bucket_location(bucket).map(|loc| (title, loc))
            }),
        };
        let Some((title, location)) = resolved else {
            debug!("Skipping tab {}: no location", key);
            continue;
        };

        let slug = match slugify(&key) {
            s if s.is_empty() => key.clone(),
            s => s,
        };
        let title = title.unwrap_or(key);
        tabs.insert(
            title.clone(),
            TabEntry {
                title,
                location,
                slug,
            },
        );
    }
    tabs
}

fn record_from_fields(location: String, fields: &Mapping) -> FrontMatterRecord {
    FrontMatterRecord {
        location,
        image: text_field(fields, "image"),
        tag: list_field(fields),
        date: text_field(fields, "date"),
        excerpt: text_field(fields, "excerpt"),
        version_label: text_field(fields, "version"),
        title: text_field(fields, "title"),
        ..FrontMatterRecord::default()
    }
}

fn item_meta(node: &Mapping) -> ItemMeta {
    ItemMeta {
        tag: list_field(node),
        image: text_field(node, "image"),
        date: text_field(node, "date"),
        excerpt: text_field(node, "excerpt"),
    }
}

/// Location of a unified bucket: an inline object, or a bare path.
fn bucket_location(bucket: &Value) -> Option<String> {
    match bucket {
        Value::Mapping(fields) => text_field(fields, "location"),
        other => path_list(other).into_iter().next(),
    }
}

/// Markdown paths held by a language bucket.
fn path_list(bucket: &Value) -> Vec<String> {
    match bucket {
        Value::String(s) => vec![s.trim().to_string()],
        Value::Sequence(items) => items.iter().filter_map(value_text).collect(),
        _ => Vec::new(),
    }
    .into_iter()
    .filter(|p| !p.is_empty())
    .collect()
}

fn text_field(node: &Mapping, key: &str) -> Option<String> {
    node.get(key).and_then(value_text).filter(|s| !s.is_empty())
}

/// `tags` or `tag`, as a list or a comma separated string.
fn list_field(node: &Mapping) -> Vec<String> {
    let raw: Vec<String> = match node.get("tags").or_else(|| node.get("tag")) {
        Some(Value::Sequence(items)) => items.iter().filter_map(value_text).collect(),
        Some(other) => value_text(other)
            .map(|s| s.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        None => Vec::new(),
    };
    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
