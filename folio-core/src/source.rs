//! Where index files and markdown come from.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{0} is empty")]
    Empty(String),

    #[error("{0} not found")]
    NotFound(String),
}

/// Text fetcher for site files, addressed by slash-separated relative paths.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_text(&self, path: &str) -> Result<String, SourceError>;
}

/// Reads site files from a local directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ContentSource for FsSource {
    async fn fetch_text(&self, path: &str) -> Result<String, SourceError> {
        let full = self.root.join(path.trim_start_matches('/'));
        let text = tokio::fs::read_to_string(&full)
            .await
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => SourceError::NotFound(path.to_string()),
                _ => SourceError::Io {
                    path: path.to_string(),
                    source,
                },
            })?;
        non_empty(path, text)
    }
}

/// Fetches site files over HTTP relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn fetch_text(&self, path: &str) -> Result<String, SourceError> {
        let url = self.url_for(path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        non_empty(path, text)
    }
}

fn non_empty(path: &str, text: String) -> Result<String, SourceError> {
    if text.trim().is_empty() {
        Err(SourceError::Empty(path.to_string()))
    } else {
        Ok(text)
    }
}

/// Join slash-separated path segments, ignoring empty ones.
pub fn join_path(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{name}"),
    }
}
