//! Site configuration parsing.

use crate::lang::{normalize, LanguageCode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("No usable config among: {0}")]
    Unavailable(String),
}

/// Main configuration struct matching the site.yaml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub content: ContentConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub title: String,

    #[serde(default = "default_language")]
    pub default_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Directory holding index files and markdown, relative to the source root
    #[serde(default = "default_root")]
    pub root: String,

    #[serde(default = "default_posts")]
    pub posts: String,

    #[serde(default = "default_tabs")]
    pub tabs: String,

    /// Maximum concurrent front matter fetches; absent or 0 means unbounded
    #[serde(default)]
    pub fetch_concurrency: Option<usize>,
}

fn default_language() -> String {
    String::from("en")
}

fn default_root() -> String {
    String::from("wwwroot")
}

fn default_posts() -> String {
    String::from("index")
}

fn default_tabs() -> String {
    String::from("tabs")
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            default_language: default_language(),
        }
    }
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            posts: default_posts(),
            tabs: default_tabs(),
            fetch_concurrency: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from YAML text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Normalized site default language
    pub fn default_language(&self) -> LanguageCode {
        normalize(&self.site.default_language)
    }

    /// Directory containing the config file, if it was loaded from disk
    pub fn site_dir(&self) -> Option<PathBuf> {
        self.config_path
            .as_ref()
            .and_then(|p| p.parent())
            .map(Path::to_path_buf)
    }
}
