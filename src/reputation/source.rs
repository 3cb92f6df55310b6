//! Blocklist sources backed by immutable snapshots.
//!
//! Readers clone the current `Arc<Snapshot>` and never hold the lock while
//! matching. A refresh builds a complete new snapshot and swaps it in; a
//! failed refresh leaves the previous snapshot in place.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Error from a domain feed.
#[derive(Debug)]
pub enum FeedError {
    /// HTTP request failed.
    Http(reqwest::Error),
    /// Non-success status or unusable body.
    InvalidResponse(String),
    /// IO error.
    Io(std::io::Error),
    /// Malformed JSON document.
    Json(serde_json::Error),
    /// The source is switched off in configuration.
    Disabled(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::Http(e) => write!(f, "HTTP error: {}", e),
            FeedError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            FeedError::Io(e) => write!(f, "IO error: {}", e),
            FeedError::Json(e) => write!(f, "JSON error: {}", e),
            FeedError::Disabled(name) => write!(f, "Source disabled: {}", name),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Http(e)
    }
}

impl From<std::io::Error> for FeedError {
    fn from(e: std::io::Error) -> Self {
        FeedError::Io(e)
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Json(e)
    }
}

/// Where a source gets its domains from.
#[async_trait]
pub trait DomainFeed: Send + Sync {
    /// Fetch the complete current domain set.
    async fn fetch(&self) -> Result<HashSet<String>, FeedError>;

    /// Feed name for logging.
    fn name(&self) -> &str;
}

/// Feed that never yields domains, for disabled sources.
pub struct DisabledFeed;

#[async_trait]
impl DomainFeed for DisabledFeed {
    async fn fetch(&self) -> Result<HashSet<String>, FeedError> {
        Ok(HashSet::new())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Lowercase, trim, and drop a trailing root dot.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn normalized(domains: HashSet<String>) -> HashSet<String> {
    domains
        .iter()
        .map(|d| normalize_domain(d))
        .filter(|d| !d.is_empty())
        .collect()
}

/// One immutable version of a source's domain set.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub domains: HashSet<String>,
    /// Set once a fetch has succeeded.
    pub loaded: bool,
    /// Incremented on every swap.
    pub version: u64,
    pub fetched_at: Option<Instant>,
}

/// Point-in-time view of a source for ops tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub name: String,
    pub domains: usize,
    pub fallback_domains: usize,
    pub loaded: bool,
    pub version: u64,
    pub age: Option<Duration>,
}

/// A named blocklist with a built-in fallback set and a refresh interval.
pub struct BlocklistSource {
    name: String,
    feed: Arc<dyn DomainFeed>,
    fallback: HashSet<String>,
    snapshot: RwLock<Arc<Snapshot>>,
    refresh_interval: Duration,
    last_attempt: RwLock<Option<Instant>>,
    refreshing: AtomicBool,
}

impl BlocklistSource {
    pub fn new(name: &str, feed: Arc<dyn DomainFeed>, refresh_interval: Duration) -> Self {
        Self {
            name: name.to_string(),
            feed,
            fallback: HashSet::new(),
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            refresh_interval,
            last_attempt: RwLock::new(None),
            refreshing: AtomicBool::new(false),
        }
    }

    /// Domains matched even before (or without) a successful fetch.
    pub fn with_fallback<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fallback = domains
            .into_iter()
            .map(|d| normalize_domain(d.as_ref()))
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot
            .read()
            .map(|s| Arc::clone(&s))
            .unwrap_or_default()
    }

    /// Exact membership in the snapshot or the fallback set.
    /// `domain` must already be normalized.
    pub fn contains(&self, domain: &str) -> bool {
        self.fallback.contains(domain) || self.snapshot().domains.contains(domain)
    }

    /// Whether the last refresh attempt is older than the refresh interval.
    pub fn is_stale(&self) -> bool {
        let last = self.last_attempt.read().ok().and_then(|l| *l);
        match last {
            Some(instant) => instant.elapsed() > self.refresh_interval,
            None => true,
        }
    }

    /// Replace the snapshot wholesale.
    pub fn replace(&self, domains: HashSet<String>) -> u64 {
        let domains = normalized(domains);

        let mut version = 0;
        if let Ok(mut current) = self.snapshot.write() {
            version = current.version + 1;
            *current = Arc::new(Snapshot {
                domains,
                loaded: true,
                version,
                fetched_at: Some(Instant::now()),
            });
        }
        version
    }

    fn mark_attempt(&self) {
        if let Ok(mut last) = self.last_attempt.write() {
            *last = Some(Instant::now());
        }
    }

    /// Swap in `domains` only if the snapshot is still at version `expected`.
    fn replace_if_current(&self, expected: u64, domains: HashSet<String>) -> Option<u64> {
        let domains = normalized(domains);

        let mut current = self.snapshot.write().ok()?;
        if current.version != expected {
            return None;
        }

        let version = expected + 1;
        *current = Arc::new(Snapshot {
            domains,
            loaded: true,
            version,
            fetched_at: Some(Instant::now()),
        });
        Some(version)
    }

    /// Fetch from the feed and swap the snapshot. On failure the previous
    /// snapshot is kept. A snapshot replaced while the fetch was in flight
    /// wins over the fetched set.
    pub async fn refresh(&self) -> Result<usize, FeedError> {
        let expected = self.snapshot().version;
        let fetched = self.feed.fetch().await;
        self.mark_attempt();
        self.refreshing.store(false, Ordering::Release);

        let domains = fetched?;
        let count = domains.len();

        match self.replace_if_current(expected, domains) {
            Some(version) => info!(
                source = %self.name,
                feed = self.feed.name(),
                domains = count,
                version,
                "Blocklist snapshot refreshed"
            ),
            None => debug!(
                source = %self.name,
                "Snapshot changed during refresh, discarding fetched set"
            ),
        }

        Ok(count)
    }

    /// Spawn a background refresh when stale. Never blocks; does nothing
    /// outside a tokio runtime or while a refresh is already running.
    pub fn refresh_in_background(self: &Arc<Self>) {
        if !self.is_stale() {
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        if self.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }

        debug!(source = %self.name, "Triggering background refresh");
        let source = Arc::clone(self);
        handle.spawn(async move {
            if let Err(e) = source.refresh().await {
                warn!(
                    source = %source.name,
                    error = %e,
                    "Background refresh failed, keeping previous snapshot"
                );
            }
        });
    }

    pub fn stats(&self) -> SourceStats {
        let snapshot = self.snapshot();
        SourceStats {
            name: self.name.clone(),
            domains: snapshot.domains.len(),
            fallback_domains: self.fallback.len(),
            loaded: snapshot.loaded,
            version: snapshot.version,
            age: snapshot.fetched_at.map(|t| t.elapsed()),
        }
    }
}
