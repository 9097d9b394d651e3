//! Opening a site: configuration, content source and assembler.

use anyhow::{Context, Result};
use folio_core::{Config, ContentAssembler, ContentSource, FsSource, HttpSource};
use std::path::PathBuf;
use std::sync::Arc;

/// Where the site lives, as given on the command line.
pub struct SiteTarget {
    pub config: PathBuf,
    pub root: Option<PathBuf>,
    pub url: Option<String>,
}

/// Load the config (defaults when the file is absent) and build an assembler.
pub fn open_site(target: &SiteTarget) -> Result<(Config, ContentAssembler)> {
    let config = if target.config.exists() {
        Config::from_file(&target.config)
            .with_context(|| format!("Failed to load configuration {:?}", target.config))?
    } else {
        tracing::debug!("No config at {:?}, using defaults", target.config);
        Config::default()
    };

    let source: Arc<dyn ContentSource> = match &target.url {
        Some(url) => {
            tracing::debug!("Reading site from {}", url);
            Arc::new(HttpSource::new(url.clone()))
        }
        None => {
            let root = match (&target.root, config.site_dir()) {
                (Some(root), _) => root.clone(),
                (None, Some(dir)) if !dir.as_os_str().is_empty() => dir,
                _ => std::env::current_dir().context("Failed to resolve current directory")?,
            };
            tracing::debug!("Reading site from {:?}", root);
            Arc::new(FsSource::new(root))
        }
    };

    let assembler = ContentAssembler::from_config(&config, source);
    Ok((config, assembler))
}
