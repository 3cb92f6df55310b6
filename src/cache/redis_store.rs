//! Redis-backed cache store.
//!
//! Entries expire natively through `SET ... EX`, so nothing is swept locally.
//! Connection handling goes through `redis::aio::ConnectionManager`, which
//! reconnects on its own after the server goes away.

use super::{CacheError, CacheStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::fmt;

impl From<RedisError> for CacheError {
    fn from(e: RedisError) -> Self {
        CacheError::Backend(e.to_string())
    }
}

/// Durable shared store.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// # Errors
    /// Returns error if the URL is invalid or the first connection fails.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<(), CacheError> {
        if ttl_seconds <= 0 {
            return Ok(());
        }

        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds as u64).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}
