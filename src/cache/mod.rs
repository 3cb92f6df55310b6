//! Status-aware result cache for deep verifications.
//!
//! Entries live under `email:<normalized address>` and expire according to
//! the reachability class the mailbox oracle reported. A class whose TTL
//! resolves to zero (or less) is never written.

pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod ttl;

use crate::config::TtlOverrides;
use crate::verdict::{Reachability, ValidationResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Key prefix for cached results.
pub const KEY_PREFIX: &str = "email:";

const DAY: i64 = 86_400;

/// Error from a cache store.
#[derive(Debug)]
pub enum CacheError {
    /// Backend unreachable or rejected the command.
    Backend(String),
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheError::Backend(msg) => write!(f, "Cache backend error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

/// Key/value store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` for `ttl_seconds`. Must not write when `ttl_seconds <= 0`.
    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), CacheError>;

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }

    /// Store name for logging.
    fn name(&self) -> &str;
}

/// TTL per reachability class, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub safe: i64,
    pub risky: i64,
    pub invalid: i64,
    pub unknown: i64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            safe: 7 * DAY,
            risky: DAY,
            invalid: 30 * DAY,
            unknown: 0,
        }
    }
}

impl TtlPolicy {
    /// Defaults with configured overrides applied.
    pub fn with_overrides(overrides: &TtlOverrides) -> Self {
        let defaults = Self::default();
        Self {
            safe: overrides.safe.unwrap_or(defaults.safe),
            risky: overrides.risky.unwrap_or(defaults.risky),
            invalid: overrides.invalid.unwrap_or(defaults.invalid),
            unknown: overrides.unknown.unwrap_or(defaults.unknown),
        }
    }

    pub fn ttl_for(&self, reachability: Reachability) -> i64 {
        match reachability {
            Reachability::Safe => self.safe,
            Reachability::Risky => self.risky,
            Reachability::Invalid => self.invalid,
            Reachability::Unknown => self.unknown,
        }
    }
}

/// Result cache over a pluggable store. Store failures read as misses.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    policy: TtlPolicy,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, policy: TtlPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &TtlPolicy {
        &self.policy
    }

    fn key(email: &str) -> String {
        format!("{}{}", KEY_PREFIX, email)
    }

    /// Serialized result for a normalized address.
    pub async fn get(&self, email: &str) -> Option<String> {
        match self.store.get(&Self::key(email)).await {
            Ok(value) => value,
            Err(e) => {
                warn!(store = self.store.name(), email = %email, error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Store a serialized result. No-op when `ttl_seconds <= 0`.
    pub async fn set(&self, email: &str, serialized: &str, ttl_seconds: i64) {
        if ttl_seconds <= 0 {
            return;
        }

        if let Err(e) = self.store.set(&Self::key(email), serialized, ttl_seconds).await {
            warn!(store = self.store.name(), email = %email, error = %e, "Cache write failed");
        }
    }

    /// Drop the entry for an address.
    pub async fn invalidate(&self, email: &str) {
        if let Err(e) = self.store.delete(&Self::key(email)).await {
            warn!(store = self.store.name(), email = %email, error = %e, "Cache delete failed");
        }
    }

    /// Decoded result for an address. Undecodable entries are dropped.
    pub async fn load(&self, email: &str) -> Option<ValidationResult> {
        let raw = self.get(email).await?;
        match serde_json::from_str::<ValidationResult>(&raw) {
            Ok(result) => {
                debug!(email = %email, "Result cache hit");
                Some(result)
            }
            Err(e) => {
                warn!(email = %email, error = %e, "Discarding undecodable cache entry");
                self.invalidate(email).await;
                None
            }
        }
    }

    /// Store a deep result under the TTL of its reachability class.
    pub async fn save(&self, result: &ValidationResult, reachability: Reachability) {
        let ttl = self.policy.ttl_for(reachability);
        if ttl <= 0 {
            debug!(email = %result.email, reachability = %reachability, "Result not cacheable");
            return;
        }

        match serde_json::to_string(result) {
            Ok(serialized) => self.set(&result.email, &serialized, ttl).await,
            Err(e) => warn!(email = %result.email, error = %e, "Failed to serialize result"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;
    use crate::verdict::Outcome;

    fn cache() -> ResultCache {
        ResultCache::new(Arc::new(MemoryStore::new(100)), TtlPolicy::default())
    }

    #[test]
    fn test_default_ttls() {
        let policy = TtlPolicy::default();
        assert_eq!(policy.ttl_for(Reachability::Safe), 604_800);
        assert_eq!(policy.ttl_for(Reachability::Invalid), 2_592_000);
        assert_eq!(policy.ttl_for(Reachability::Risky), 86_400);
        assert_eq!(policy.ttl_for(Reachability::Unknown), 0);
    }

    #[test]
    fn test_overrides() {
        let overrides = TtlOverrides {
            safe: Some(60),
            unknown: Some(30),
            ..TtlOverrides::default()
        };
        let policy = TtlPolicy::with_overrides(&overrides);
        assert_eq!(policy.safe, 60);
        assert_eq!(policy.unknown, 30);
        assert_eq!(policy.risky, 86_400);
    }

    #[tokio::test]
    async fn test_set_with_non_positive_ttl_is_noop() {
        let cache = cache();
        cache.set("a@example.com", "{}", 0).await;
        cache.set("b@example.com", "{}", -5).await;
        assert!(cache.get("a@example.com").await.is_none());
        assert!(cache.get("b@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_key_prefix() {
        let store = Arc::new(MemoryStore::new(100));
        let cache = ResultCache::new(store.clone(), TtlPolicy::default());
        cache.set("a@example.com", "payload", 60).await;

        assert_eq!(
            store.get("email:a@example.com").await.unwrap().as_deref(),
            Some("payload")
        );
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let cache = cache();
        let result = ValidationResult::from_outcome("a@example.com", Outcome::ValidDeep);

        cache.save(&result, Reachability::Safe).await;
        assert_eq!(cache.load("a@example.com").await, Some(result));
    }

    #[tokio::test]
    async fn test_unknown_is_never_saved() {
        let cache = cache();
        let result = ValidationResult::from_outcome("a@example.com", Outcome::SmtpError);

        cache.save(&result, Reachability::Unknown).await;
        assert!(cache.get("a@example.com").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_dropped() {
        let store = Arc::new(MemoryStore::new(100));
        let cache = ResultCache::new(store.clone(), TtlPolicy::default());
        cache.set("a@example.com", "not json", 60).await;

        assert!(cache.load("a@example.com").await.is_none());
        assert!(store.get("email:a@example.com").await.unwrap().is_none());
    }

    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("down".into()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: i64) -> Result<(), CacheError> {
            Err(CacheError::Backend("down".into()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[tokio::test]
    async fn test_store_errors_read_as_miss() {
        let cache = ResultCache::new(Arc::new(BrokenStore), TtlPolicy::default());
        let result = ValidationResult::from_outcome("a@example.com", Outcome::ValidDeep);

        cache.save(&result, Reachability::Safe).await;
        assert!(cache.load("a@example.com").await.is_none());
    }
}
