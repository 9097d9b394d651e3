//! Bounded-concurrency front matter fetching with a permanent cache.
//!
//! One [`FetchQueue`] is created per site session and handed to every
//! [`ContentAssembler`](crate::assembler::ContentAssembler) that needs it.
//! It owns the only shared mutable state of the pipeline: the
//! `path -> record` cache, the in-flight map and the admission queue, all
//! behind one mutex so that check-cache / enqueue / mark-in-flight happens
//! atomically.

use crate::frontmatter::{extract_front_matter, FrontMatterValue, ParsedDocument};
use crate::models::FrontMatterRecord;
use crate::source::{join_path, ContentSource};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

type SharedRecord = Shared<BoxFuture<'static, Arc<FrontMatterRecord>>>;

/// Deduplicating, cached, FIFO front matter fetcher.
///
/// Requests must be made from within a tokio runtime: admitted jobs are
/// spawned as tasks so they make progress whether or not the caller polls.
#[derive(Clone)]
pub struct FetchQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    source: Arc<dyn ContentSource>,
    root: String,
    limit: Option<usize>,
    state: Mutex<QueueState>,
}

#[derive(Default)]
struct QueueState {
    cache: HashMap<String, Arc<FrontMatterRecord>>,
    in_flight: HashMap<String, SharedRecord>,
    waiting: VecDeque<Job>,
    active: usize,
    started: usize,
}

struct Job {
    path: String,
    done: oneshot::Sender<Arc<FrontMatterRecord>>,
}

impl FetchQueue {
    /// Create a queue reading markdown under `root` of `source`.
    ///
    /// `limit` caps concurrent fetches; `None` or `Some(0)` means unbounded.
    pub fn new(source: Arc<dyn ContentSource>, root: impl Into<String>, limit: Option<usize>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                source,
                root: root.into(),
                limit: limit.filter(|n| *n > 0),
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Resolve the front matter record for a markdown path.
    ///
    /// Cached paths resolve immediately; concurrent requests for the same
    /// path share one fetch and the same `Arc`. Never fails: fetch errors
    /// degrade to [`FrontMatterRecord::stub`].
    pub fn request(&self, path: &str) -> BoxFuture<'static, Arc<FrontMatterRecord>> {
        let (shared, admitted) = {
            let mut state = self.inner.state.lock();

            if let Some(record) = state.cache.get(path) {
                return futures::future::ready(record.clone()).boxed();
            }
            if let Some(pending) = state.in_flight.get(path) {
                return pending.clone().boxed();
            }

            let (done, rx) = oneshot::channel();
            let fallback = path.to_string();
            let shared: SharedRecord = rx
                .map(move |result| {
                    result.unwrap_or_else(|_| Arc::new(FrontMatterRecord::stub(fallback)))
                })
                .boxed()
                .shared();
            state.in_flight.insert(path.to_string(), shared.clone());

            let job = Job {
                path: path.to_string(),
                done,
            };
            let admitted = if self.inner.has_capacity(&state) {
                state.active += 1;
                state.started += 1;
                Some(job)
            } else {
                debug!(path, queued = state.waiting.len() + 1, "Queueing front matter fetch");
                state.waiting.push_back(job);
                None
            };
            (shared, admitted)
        };

        if let Some(job) = admitted {
            self.inner.spawn(job);
        }
        shared.boxed()
    }

    /// Cached records for `paths` and the paths that missed, read under one
    /// lock. Misses are represented by [`FrontMatterRecord::stub`].
    pub fn snapshot(&self, paths: &[String]) -> (Vec<Arc<FrontMatterRecord>>, Vec<String>) {
        let state = self.inner.state.lock();
        let mut records = Vec::with_capacity(paths.len());
        let mut missing = Vec::new();
        for path in paths {
            match state.cache.get(path) {
                Some(record) => records.push(record.clone()),
                None => {
                    records.push(Arc::new(FrontMatterRecord::stub(path.as_str())));
                    missing.push(path.clone());
                }
            }
        }
        (records, missing)
    }

    /// Number of fetches started against the source so far.
    pub fn fetches_started(&self) -> usize {
        self.inner.state.lock().started
    }

    /// Number of fetches currently running.
    pub fn active(&self) -> usize {
        self.inner.state.lock().active
    }

    pub fn limit(&self) -> Option<usize> {
        self.inner.limit
    }
}

impl QueueInner {
    fn has_capacity(&self, state: &QueueState) -> bool {
        self.limit.map_or(true, |limit| state.active < limit)
    }

    fn spawn(self: &Arc<Self>, job: Job) {
        let inner = Arc::clone(self);
        debug!(path = %job.path, "Fetching front matter");
        tokio::spawn(async move {
            let record = inner.fetch_record(&job.path).await;
            let (record, next) = inner.finish(&job.path, record);
            let _ = job.done.send(record);
            if let Some(next) = next {
                inner.spawn(next);
            }
        });
    }

    async fn fetch_record(&self, path: &str) -> FrontMatterRecord {
        let url = join_path(&self.root, path);
        match self.source.fetch_text(&url).await {
            Ok(text) => record_from_markdown(path, &text),
            Err(err) => {
                warn!("Front matter fetch for {} failed: {}", path, err);
                FrontMatterRecord::stub(path)
            }
        }
    }

    /// Cache the record and hand this job's slot to the next waiting job.
    fn finish(&self, path: &str, record: FrontMatterRecord) -> (Arc<FrontMatterRecord>, Option<Job>) {
        let mut state = self.state.lock();
        let record = state
            .cache
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(record))
            .clone();
        state.in_flight.remove(path);

        let next = state.waiting.pop_front();
        if next.is_some() {
            state.started += 1;
        } else {
            state.active -= 1;
        }
        (record, next)
    }
}

/// Project the recognized front matter fields of one markdown file.
pub fn record_from_markdown(location: &str, text: &str) -> FrontMatterRecord {
    let doc = extract_front_matter(text);

    FrontMatterRecord {
        location: location.to_string(),
        image: doc
            .text("image")
            .map(|image| resolve_relative(location, &image)),
        tag: tags(&doc),
        date: doc.text("date"),
        excerpt: doc.text("excerpt"),
        version_label: doc.text("version"),
        ai: any_truthy(&doc, &["ai", "aiGenerated", "llm"]),
        draft: any_truthy(&doc, &["draft", "wip", "unfinished", "inprogress"]),
        author: doc.text("author"),
        title: doc.text("title"),
    }
}

/// `true|1|yes|y|on|enabled`, case-insensitive; YAML booleans as-is.
pub fn is_truthy(value: &FrontMatterValue) -> bool {
    match value {
        FrontMatterValue::Flag(b) => *b,
        other => other.as_text().is_some_and(|s| {
            matches!(
                s.to_lowercase().as_str(),
                "true" | "1" | "yes" | "y" | "on" | "enabled"
            )
        }),
    }
}

/// `None` when none of `keys` is present, otherwise whether any is truthy.
fn any_truthy(doc: &ParsedDocument, keys: &[&str]) -> Option<bool> {
    let mut seen = false;
    for key in keys {
        if let Some(value) = doc.get(key) {
            seen = true;
            if is_truthy(value) {
                return Some(true);
            }
        }
    }
    seen.then_some(false)
}

fn tags(doc: &ParsedDocument) -> Vec<String> {
    let Some(value) = doc.get("tags").or_else(|| doc.get("tag")) else {
        return Vec::new();
    };
    let raw = match value {
        FrontMatterValue::Text(s) => s.split(',').map(str::to_string).collect(),
        other => other.to_list(),
    };
    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Resolve an image path against the directory of the markdown file.
///
/// Absolute paths, URLs (any scheme, or protocol-relative) and data URIs
/// are returned untouched.
pub fn resolve_relative(markdown_path: &str, image: &str) -> String {
    let image = image.trim();
    if image.starts_with('/') || image.starts_with("data:") || has_scheme(image) {
        return image.to_string();
    }

    let mut segments: Vec<&str> = markdown_path.split('/').collect();
    segments.pop();
    for part in image.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.retain(|s| !s.is_empty());
    segments.join("/")
}

fn has_scheme(s: &str) -> bool {
    match s.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory source that counts fetches and tracks peak concurrency.
    #[derive(Default)]
    struct MemorySource {
        files: HashMap<String, String>,
        delay: Duration,
        calls: AtomicUsize,
        current: AtomicUsize,
        peak: AtomicUsize,
        order: Mutex<Vec<String>>,
    }

    impl MemorySource {
        fn with(files: &[(&str, &str)], delay: Duration) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                delay,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ContentSource for MemorySource {
        async fn fetch_text(&self, path: &str) -> Result<String, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.order.lock().push(path.to_string());
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| SourceError::NotFound(path.to_string()))
        }
    }

    #[tokio::test]
    async fn test_projects_recognized_fields() {
        let source = Arc::new(MemorySource::with(
            &[(
                "wwwroot/post/a/a.md",
                "---\ntitle: Hello\ndate: 2024-05-01\ntags: [rust, async]\nimage: cover.png\nversion: v2\naiGenerated: 'Yes'\nwip: 'off'\nauthor: Ana\nexcerpt: Short\n---\nBody",
            )],
            Duration::ZERO,
        ));
        let queue = FetchQueue::new(source, "wwwroot", Some(2));

        let record = queue.request("post/a/a.md").await;
        assert_eq!(record.location, "post/a/a.md");
        assert_eq!(record.title.as_deref(), Some("Hello"));
        assert_eq!(record.date.as_deref(), Some("2024-05-01"));
        assert_eq!(record.tag, vec!["rust", "async"]);
        assert_eq!(record.image.as_deref(), Some("post/a/cover.png"));
        assert_eq!(record.version_label.as_deref(), Some("v2"));
        assert_eq!(record.ai, Some(true));
        assert_eq!(record.draft, Some(false));
        assert_eq!(record.author.as_deref(), Some("Ana"));
        assert_eq!(record.excerpt.as_deref(), Some("Short"));
    }

    #[tokio::test]
    async fn test_failure_degrades_to_stub() {
        let source = Arc::new(MemorySource::default());
        let queue = FetchQueue::new(source, "wwwroot", None);

        let record = queue.request("post/missing.md").await;
        assert_eq!(*record, FrontMatterRecord::stub("post/missing.md"));
        let (_, missing) = queue.snapshot(&["post/missing.md".to_string()]);
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_reports_misses() {
        let source = Arc::new(MemorySource::with(
            &[("root/a.md", "---\ntitle: A\n---\n")],
            Duration::from_millis(1),
        ));
        let queue = FetchQueue::new(source.clone(), "root", None);
        queue.request("a.md").await;

        let paths = vec!["a.md".to_string(), "b.md".to_string()];
        let (records, missing) = queue.snapshot(&paths);
        assert_eq!(records[0].title.as_deref(), Some("A"));
        assert_eq!(*records[1], FrontMatterRecord::stub("b.md"));
        assert_eq!(missing, vec!["b.md"]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let source = Arc::new(MemorySource::with(
            &[("root/a.md", "---\ntitle: A\n---\n")],
            Duration::from_millis(20),
        ));
        let queue = FetchQueue::new(source.clone(), "root", Some(1));

        let (first, second) = tokio::join!(queue.request("a.md"), queue.request("a.md"));
        assert!(Arc::ptr_eq(&first, &second));

        let third = queue.request("a.md").await;
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(queue.fetches_started(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_bound_and_fifo() {
        for limit in 1..=4 {
            let files: Vec<(String, String)> = (0..10)
                .map(|i| (format!("root/p{i}.md"), format!("---\ntitle: P{i}\n---\n")))
                .collect();
            let refs: Vec<(&str, &str)> =
                files.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            let source = Arc::new(MemorySource::with(&refs, Duration::from_millis(5)));
            let queue = FetchQueue::new(source.clone(), "root", Some(limit));

            let requests: Vec<_> = (0..10).map(|i| queue.request(&format!("p{i}.md"))).collect();
            let records = futures::future::join_all(requests).await;

            assert_eq!(records.len(), 10);
            assert!(source.peak.load(Ordering::SeqCst) <= limit, "limit {limit}");
            assert_eq!(queue.active(), 0);
            if limit == 1 {
                let order = source.order.lock().clone();
                let expected: Vec<String> = (0..10).map(|i| format!("root/p{i}.md")).collect();
                assert_eq!(order, expected);
            }
        }
    }

    #[tokio::test]
    async fn test_unbounded_runs_everything_at_once() {
        let files: Vec<(String, String)> = (0..6)
            .map(|i| (format!("r/p{i}.md"), "body".to_string()))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let source = Arc::new(MemorySource::with(&refs, Duration::from_millis(20)));
        let queue = FetchQueue::new(source.clone(), "r", Some(0));
        assert_eq!(queue.limit(), None);

        let requests: Vec<_> = (0..6).map(|i| queue.request(&format!("p{i}.md"))).collect();
        futures::future::join_all(requests).await;
        assert_eq!(source.peak.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_truthy_grammar() {
        let text = |s: &str| FrontMatterValue::Text(s.to_string());
        assert!(is_truthy(&text("Yes")));
        assert!(is_truthy(&text("ENABLED")));
        assert!(is_truthy(&text("1")));
        assert!(is_truthy(&FrontMatterValue::Flag(true)));
        assert!(!is_truthy(&text("0")));
        assert!(!is_truthy(&text("YES ")));
        assert!(!is_truthy(&text("nope")));
        assert!(!is_truthy(&FrontMatterValue::Flag(false)));
    }

    #[test]
    fn test_draft_flag_presence() {
        let yes = record_from_markdown("a.md", "---\ndraft: \"Yes\"\n---\n");
        assert_eq!(yes.draft, Some(true));
        let zero = record_from_markdown("a.md", "---\ndraft: \"0\"\n---\n");
        assert_eq!(zero.draft, Some(false));
        let absent = record_from_markdown("a.md", "---\ntitle: T\n---\n");
        assert_eq!(absent.draft, None);
        let wip = record_from_markdown("a.md", "---\nunfinished: true\n---\n");
        assert_eq!(wip.draft, Some(true));
    }

    #[test]
    fn test_tag_fallbacks() {
        let single = record_from_markdown("a.md", "---\ntag: notes\n---\n");
        assert_eq!(single.tag, vec!["notes"]);
        let comma = record_from_markdown("a.md", "---\ntags: 'a, b ,'\n---\n");
        assert_eq!(comma.tag, vec!["a", "b"]);
    }

    #[test]
    fn test_malformed_front_matter_still_yields_location() {
        let record = record_from_markdown("post/x.md", "---\ntitle: [oops\n---\nBody");
        assert_eq!(record, FrontMatterRecord::stub("post/x.md"));
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(resolve_relative("post/a/a.md", "cover.png"), "post/a/cover.png");
        assert_eq!(resolve_relative("post/a/a.md", "./img/c.png"), "post/a/img/c.png");
        assert_eq!(resolve_relative("post/a/a.md", "../shared/c.png"), "post/shared/c.png");
        assert_eq!(resolve_relative("a.md", "c.png"), "c.png");
        assert_eq!(resolve_relative("post/a.md", "/abs/c.png"), "/abs/c.png");
        assert_eq!(
            resolve_relative("post/a.md", "https://cdn.example.com/c.png"),
            "https://cdn.example.com/c.png"
        );
        assert_eq!(
            resolve_relative("post/a.md", "//cdn.example.com/c.png"),
            "//cdn.example.com/c.png"
        );
        assert_eq!(
            resolve_relative("post/a.md", "data:image/png;base64,AAA"),
            "data:image/png;base64,AAA"
        );
    }
}
