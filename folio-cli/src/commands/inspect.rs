//! Offline inspection helpers.

use anyhow::{Context, Result};
use folio_core::classify::classify_decisive;
use folio_core::normalize;
use std::fs;
use std::path::Path;

/// Print the shape of a local index file.
pub fn classify_file(path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let raw: serde_yaml::Value =
        serde_yaml::from_str(&text).with_context(|| format!("Failed to parse {:?}", path))?;

    match classify_decisive(&raw) {
        Some(format) => println!("{format}"),
        None => {
            tracing::info!("No recognizable items in {:?}; loads fall back to language files", path);
            println!("{}", folio_core::ConfigFormat::LegacyFlat);
        }
    }
    Ok(())
}

/// Print `label<TAB>code` for each label.
pub fn normalize_labels(labels: &[String]) {
    for label in labels {
        println!("{}\t{}", label, normalize(label));
    }
}
