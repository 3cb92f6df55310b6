//! Domains discovered by the external scraper bot.
//!
//! The bot writes a JSON document to disk; this module reloads it on its own
//! refresh interval and lets operators add domains by hand. A manual add is a
//! set union that is written back before it becomes visible.

use super::source::{normalize_domain, BlocklistSource, DisabledFeed, DomainFeed, FeedError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// On-disk document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredDocument {
    #[serde(default)]
    pub domains: Vec<String>,
    /// Epoch milliseconds of the bot's last run.
    #[serde(default)]
    pub last_scrape: u64,
    #[serde(default)]
    pub count: usize,
}

impl DiscoveredDocument {
    fn domain_set(&self) -> HashSet<String> {
        self.domains
            .iter()
            .map(|d| normalize_domain(d))
            .filter(|d| !d.is_empty())
            .collect()
    }
}

/// Read the document. A missing file is an empty document.
pub async fn read_document(path: &Path) -> Result<DiscoveredDocument, FeedError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Discovered-domain file does not exist yet");
            Ok(DiscoveredDocument::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Write the document atomically (temp file + rename).
pub async fn write_document(path: &Path, document: &DiscoveredDocument) -> Result<(), FeedError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(document)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Feed reading the document from disk.
pub struct DiscoveredFileFeed {
    path: PathBuf,
}

impl DiscoveredFileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DomainFeed for DiscoveredFileFeed {
    async fn fetch(&self) -> Result<HashSet<String>, FeedError> {
        Ok(read_document(&self.path).await?.domain_set())
    }

    fn name(&self) -> &str {
        "discovered-file"
    }
}

/// Durable discovered-domain set.
pub struct DiscoveredDomainStore {
    path: PathBuf,
    enabled: bool,
    source: Arc<BlocklistSource>,
    write_lock: Mutex<()>,
}

impl DiscoveredDomainStore {
    pub fn new(path: impl Into<PathBuf>, refresh_interval: Duration) -> Self {
        let path = path.into();
        let feed = Arc::new(DiscoveredFileFeed::new(path.clone()));
        Self {
            source: Arc::new(BlocklistSource::new("discovered", feed, refresh_interval)),
            path,
            enabled: true,
            write_lock: Mutex::new(()),
        }
    }

    /// A store that never reads or writes `path` and matches nothing.
    pub fn disabled(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Arc::new(BlocklistSource::new(
                "discovered",
                Arc::new(DisabledFeed),
                Duration::from_secs(u64::MAX / 4),
            )),
            path: path.into(),
            enabled: false,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn source(&self) -> &Arc<BlocklistSource> {
        &self.source
    }

    /// Merge domains into the durable set and persist immediately.
    /// Returns how many were new. Adding known domains is a no-op.
    pub async fn add<I, S>(&self, domains: I) -> Result<usize, FeedError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !self.enabled {
            return Err(FeedError::Disabled("discovered".to_string()));
        }

        let _guard = self.write_lock.lock().await;

        let mut document = read_document(&self.path).await?;
        let mut merged: BTreeSet<String> = document.domain_set().into_iter().collect();
        merged.extend(self.source.snapshot().domains.iter().cloned());
        let before = merged.len();

        merged.extend(
            domains
                .into_iter()
                .map(|d| normalize_domain(d.as_ref()))
                .filter(|d| d.contains('.')),
        );
        let added = merged.len() - before;

        if added > 0 || !self.source.snapshot().loaded {
            document.domains = merged.iter().cloned().collect();
            document.count = document.domains.len();
            write_document(&self.path, &document).await?;
            self.source.replace(merged.into_iter().collect());
            info!(path = %self.path.display(), added, total = document.count, "Discovered domains added");
        }

        Ok(added)
    }
}
