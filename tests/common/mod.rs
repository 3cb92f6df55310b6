//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use zentinel_agent_email_reputation::cache::memory::MemoryStore;
use zentinel_agent_email_reputation::cache::{ResultCache, TtlPolicy};
use zentinel_agent_email_reputation::oracles::{
    DisposableOracle, FormatOracle, FormatReport, FormatRequest, MailboxOracle, MailboxReport,
    OracleError,
};
use zentinel_agent_email_reputation::reputation::discovered::DiscoveredDomainStore;
use zentinel_agent_email_reputation::reputation::source::{BlocklistSource, DomainFeed, FeedError};
use zentinel_agent_email_reputation::{EmailValidator, Reachability, ReputationStore};

pub const HOUR: Duration = Duration::from_secs(3600);

/// Feed that always returns the same domains.
pub struct StaticFeed(pub Vec<&'static str>);

#[async_trait]
impl DomainFeed for StaticFeed {
    async fn fetch(&self) -> Result<HashSet<String>, FeedError> {
        Ok(self.0.iter().map(|d| d.to_string()).collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Reputation store with a fixed remote list and nothing else. The
/// discovered-domain file lives in the returned directory.
pub async fn reputation(remote: Vec<&'static str>) -> (TempDir, Arc<ReputationStore>) {
    let dir = TempDir::new().unwrap();
    let store = ReputationStore::from_parts(
        DiscoveredDomainStore::new(dir.path().join("discovered.json"), HOUR),
        BlocklistSource::new("scraped", Arc::new(StaticFeed(vec![])), HOUR),
        BlocklistSource::new("remote", Arc::new(StaticFeed(remote)), HOUR),
    );
    store.refresh_now().await;
    (dir, Arc::new(store))
}

/// Format oracle with a fixed answer and optional per-address latency.
#[derive(Default)]
pub struct MockFormat {
    pub report: Option<FormatReport>,
    pub latency: HashMap<String, Duration>,
    pub calls: AtomicUsize,
}

impl MockFormat {
    pub fn clean() -> Arc<Self> {
        Arc::new(Self {
            report: Some(FormatReport::clean()),
            ..Self::default()
        })
    }

    pub fn with_latency(latency: &[(&str, u64)]) -> Arc<Self> {
        Arc::new(Self {
            report: Some(FormatReport::clean()),
            latency: latency
                .iter()
                .map(|(email, ms)| (email.to_string(), Duration::from_millis(*ms)))
                .collect(),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FormatOracle for MockFormat {
    async fn check(&self, request: &FormatRequest) -> Result<FormatReport, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.latency.get(&request.email) {
            tokio::time::sleep(*delay).await;
        }
        self.report
            .clone()
            .ok_or_else(|| OracleError::InvalidResponse("HTTP 502".to_string()))
    }

    fn name(&self) -> &str {
        "mock-format"
    }
}

/// How the mock realtime oracle behaves.
pub enum Realtime {
    Answer(bool),
    Fail,
    Hang,
}

pub struct MockRealtime {
    pub behavior: Realtime,
    pub calls: AtomicUsize,
}

impl MockRealtime {
    pub fn new(behavior: Realtime) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DisposableOracle for MockRealtime {
    async fn is_disposable(&self, _email: &str) -> Result<bool, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Realtime::Answer(flag) => Ok(flag),
            Realtime::Fail => Err(OracleError::Other("connection reset".to_string())),
            Realtime::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(true)
            }
        }
    }

    fn name(&self) -> &str {
        "mock-realtime"
    }
}

pub struct MockMailbox {
    pub report: MailboxReport,
    pub calls: AtomicUsize,
}

impl MockMailbox {
    pub fn new(reachability: Reachability) -> Arc<Self> {
        Arc::new(Self {
            report: MailboxReport {
                reachability,
                syntax_valid: true,
                accepts_mail: true,
                can_connect: true,
                has_full_inbox: false,
                is_catch_all: false,
                is_deliverable: true,
                is_disabled: false,
                disposable: false,
            },
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MailboxOracle for MockMailbox {
    async fn verify(&self, _email: &str) -> Result<MailboxReport, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.report.clone())
    }

    fn name(&self) -> &str {
        "mock-mailbox"
    }
}

pub fn memory_cache() -> ResultCache {
    ResultCache::new(Arc::new(MemoryStore::new(1000)), TtlPolicy::default())
}

pub fn validator(reputation: Arc<ReputationStore>, format: Arc<MockFormat>) -> EmailValidator {
    EmailValidator::new(reputation, format)
}
