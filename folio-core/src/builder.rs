//! Folding the path variants of one logical post into a [`ContentEntry`].

use crate::models::{newest_first, ContentEntry, FrontMatterRecord};
use std::sync::Arc;

/// Build a canonical entry from every variant of one item.
///
/// Variants without a location are dropped, the rest are ordered newest
/// first (undated variants last, encounter order on ties). The newest
/// variant supplies the entry's fields; its title hint, or
/// `fallback_title`, becomes the entry title. Returns `None` when no
/// variant has a location.
pub fn build_entry(variants: &[Arc<FrontMatterRecord>], fallback_title: &str) -> Option<ContentEntry> {
    let mut usable: Vec<&FrontMatterRecord> = variants
        .iter()
        .map(Arc::as_ref)
        .filter(|r| !r.location.trim().is_empty())
        .collect();
    usable.sort_by(|a, b| newest_first(a.parsed_date(), b.parsed_date()));

    let primary = *usable.first()?;
    let title = primary
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| fallback_title.to_string());

    let versions = usable
        .iter()
        .map(|r| FrontMatterRecord {
            title: None,
            ..(*r).clone()
        })
        .collect();

    Some(ContentEntry {
        title,
        location: primary.location.clone(),
        image: primary.image.clone(),
        tag: primary.tag.clone(),
        date: primary.date.clone(),
        excerpt: primary.excerpt.clone(),
        version_label: primary.version_label.clone(),
        ai: primary.ai,
        draft: primary.draft,
        author: primary.author.clone(),
        versions,
    })
}
