//! Domain reputation aggregator.
//!
//! Three local sources are checked in a fixed order, OR-combined:
//!
//! 1. **discovered** - domains found by the scraper bot or added by hand (exact match)
//! 2. **scraped** - provider pages plus a static fallback list (exact match)
//! 3. **remote** - public blocklist plus a hardcoded immediate subset (exact,
//!    then ancestor-domain match)
//!
//! Lookups never touch the network. A stale source is refreshed by a spawned
//! task that the caller does not wait for.

pub mod builtin;
pub mod discovered;
pub mod feeds;
pub mod scraper;
pub mod source;

use crate::config::ReputationConfig;
use builtin::{IMMEDIATE_BLOCKLIST, STATIC_PROVIDER_DOMAINS};
use discovered::DiscoveredDomainStore;
use feeds::RemoteListFeed;
use scraper::ScraperFeed;
use source::{
    normalize_domain, BlocklistSource, DisabledFeed, DomainFeed, FeedError, SourceStats,
};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Suffixes of `domain` formed by dropping 1..(n-2) leading labels.
///
/// The bare TLD is never produced: `evil.mail.tempmail.com` yields
/// `mail.tempmail.com` and `tempmail.com`.
pub fn ancestor_suffixes(domain: &str) -> impl Iterator<Item = &str> {
    domain
        .match_indices('.')
        .map(move |(i, _)| &domain[i + 1..])
        .filter(|suffix| suffix.contains('.'))
}

/// Which source produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Discovered,
    Scraped,
    Remote,
}

/// Outcome of one source refresh.
#[derive(Debug)]
pub struct RefreshReport {
    pub source: String,
    pub result: Result<usize, FeedError>,
}

/// Owned set of blocklist sources.
pub struct ReputationStore {
    discovered: Arc<DiscoveredDomainStore>,
    scraped: Arc<BlocklistSource>,
    remote: Arc<BlocklistSource>,
}

impl ReputationStore {
    /// Build sources from configuration. Nothing is fetched yet.
    pub fn new(config: &ReputationConfig) -> Result<Self, FeedError> {
        let remote_feed: Arc<dyn DomainFeed> = if config.remote.enabled {
            Arc::new(RemoteListFeed::new(&config.remote)?)
        } else {
            Arc::new(DisabledFeed)
        };
        let scraper_feed: Arc<dyn DomainFeed> = if config.scraper.enabled {
            Arc::new(ScraperFeed::new(&config.scraper)?)
        } else {
            Arc::new(DisabledFeed)
        };

        let remote = BlocklistSource::new(
            "remote",
            remote_feed,
            Duration::from_secs(config.remote.refresh_interval_seconds),
        )
        .with_fallback(IMMEDIATE_BLOCKLIST.iter().copied());

        let scraped = BlocklistSource::new(
            "scraped",
            scraper_feed,
            Duration::from_secs(config.scraper.refresh_interval_seconds),
        )
        .with_fallback(STATIC_PROVIDER_DOMAINS.iter().copied());

        let discovered = if config.discovered.enabled {
            DiscoveredDomainStore::new(
                config.discovered.path.clone(),
                Duration::from_secs(config.discovered.refresh_interval_seconds),
            )
        } else {
            DiscoveredDomainStore::disabled(config.discovered.path.clone())
        };

        Ok(Self::from_parts(discovered, scraped, remote))
    }

    /// Assemble a store from prepared sources.
    pub fn from_parts(
        discovered: DiscoveredDomainStore,
        scraped: BlocklistSource,
        remote: BlocklistSource,
    ) -> Self {
        Self {
            discovered: Arc::new(discovered),
            scraped: Arc::new(scraped),
            remote: Arc::new(remote),
        }
    }

    /// Process-wide default store built from the default configuration.
    pub fn shared() -> Arc<ReputationStore> {
        static SHARED: OnceLock<Arc<ReputationStore>> = OnceLock::new();
        SHARED
            .get_or_init(|| {
                let store = ReputationStore::new(&ReputationConfig::default()).unwrap_or_else(|e| {
                    warn!(error = %e, "Default feeds unavailable, serving built-in lists only");
                    ReputationStore::builtin_only()
                });
                Arc::new(store)
            })
            .clone()
    }

    /// Store with only the built-in lists and no network feeds.
    pub fn builtin_only() -> Self {
        let never = Duration::from_secs(u64::MAX / 4);
        Self::from_parts(
            DiscoveredDomainStore::disabled(ReputationConfig::default().discovered.path),
            BlocklistSource::new("scraped", Arc::new(DisabledFeed), never)
                .with_fallback(STATIC_PROVIDER_DOMAINS.iter().copied()),
            BlocklistSource::new("remote", Arc::new(DisabledFeed), never)
                .with_fallback(IMMEDIATE_BLOCKLIST.iter().copied()),
        )
    }

    fn sources(&self) -> [&Arc<BlocklistSource>; 3] {
        [self.discovered.source(), &self.scraped, &self.remote]
    }

    pub fn discovered(&self) -> &DiscoveredDomainStore {
        &self.discovered
    }

    /// Best-effort initial load of every source.
    pub async fn initialize(&self) {
        for report in self.refresh_now().await {
            match report.result {
                Ok(count) => debug!(source = %report.source, domains = count, "Source loaded"),
                Err(e) => warn!(
                    source = %report.source,
                    error = %e,
                    "Initial load failed, serving fallback list"
                ),
            }
        }
        info!(sources = ?self.stats(), "Reputation store initialized");
    }

    /// Refresh every source now and wait for all of them.
    pub async fn refresh_now(&self) -> Vec<RefreshReport> {
        let mut reports = Vec::with_capacity(3);
        for source in self.sources() {
            reports.push(RefreshReport {
                source: source.name().to_string(),
                result: source.refresh().await,
            });
        }
        reports
    }

    /// Which source lists `domain`, if any.
    pub fn lookup(&self, domain: &str) -> Option<MatchSource> {
        for source in self.sources() {
            source.refresh_in_background();
        }

        let domain = normalize_domain(domain);
        if domain.is_empty() {
            return None;
        }

        if self.discovered.source().contains(&domain) {
            return Some(MatchSource::Discovered);
        }

        if self.scraped.contains(&domain) {
            return Some(MatchSource::Scraped);
        }

        if self.remote.contains(&domain)
            || ancestor_suffixes(&domain).any(|suffix| self.remote.contains(suffix))
        {
            return Some(MatchSource::Remote);
        }

        None
    }

    /// Whether `domain` belongs to a disposable provider.
    pub fn is_disposable(&self, domain: &str) -> bool {
        match self.lookup(domain) {
            Some(source) => {
                debug!(domain = %domain, source = ?source, "Domain found in local blocklist");
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> Vec<SourceStats> {
        self.sources().iter().map(|s| s.stats()).collect()
    }
}
