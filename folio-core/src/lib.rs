//! # folio-core
//!
//! Content localization and metadata resolution for folio sites.
//!
//! This crate turns a site's YAML index files into per-language result
//! maps: it classifies the index shape, walks each item's language
//! fallback chain, enriches entries from markdown front matter through a
//! bounded, cached fetch queue, and republishes corrected maps once that
//! enrichment settles.

pub mod assembler;
pub mod builder;
pub mod classify;
pub mod config;
pub mod events;
pub mod frontmatter;
pub mod lang;
pub mod models;
pub mod queue;
pub mod slug;
pub mod source;

pub use assembler::{ContentAssembler, ContentLoad};
pub use builder::build_entry;
pub use classify::{classify, ConfigFormat};
pub use config::Config;
pub use events::{EnrichmentEvent, EnrichmentEvents, EnrichmentHandle};
pub use lang::{normalize, LanguageCode};
pub use models::{ContentEntry, FrontMatterRecord, ResultMap, TabEntry, TabMap};
pub use queue::FetchQueue;
pub use slug::slugify;
pub use source::{ContentSource, FsSource, HttpSource, SourceError};
