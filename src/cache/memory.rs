//! Process-local cache store.

use super::ttl::TtlMap;
use super::{CacheError, CacheStore};
use async_trait::async_trait;
use std::time::Duration;

/// In-memory store with lazy expiry on read.
pub struct MemoryStore {
    entries: TtlMap<String, String>,
}

impl MemoryStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: TtlMap::new(max_entries),
        }
    }

    /// Drop expired entries.
    pub fn cleanup(&self) {
        self.entries.cleanup();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(&key.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), CacheError> {
        if ttl_seconds <= 0 {
            return Ok(());
        }

        self.entries.insert(
            key.to_string(),
            value.to_string(),
            Duration::from_secs(ttl_seconds as u64),
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(&key.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
