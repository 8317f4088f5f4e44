//! Redis-backed list store.
//!
//! # Layout
//!
//! The logical tail of a list is the Redis *left* end:
//!
//! - `push_tail` is `LPUSH`
//! - `pop_head_push_tail` is `RPOPLPUSH` (oldest element from the right of
//!   the source onto the left of the destination)
//!
//! This keeps FIFO order and matches the key layout of existing redqueue
//! producers and consumers, so both can share the same lists.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use super::ListStore;
use crate::error::StoreError;

/// List store backed by a Redis server.
///
/// Cloning is cheap: clones share the same multiplexed connection.
#[derive(Clone)]
pub struct RedisStore {
    /// Redis connection manager (handles reconnection automatically).
    redis: ConnectionManager,
}

impl RedisStore {
    /// Connects to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `StoreError::ConnectionFailed` if the URL is invalid or the
    /// server cannot be reached.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        let redis = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        debug!("connected to redis");
        Ok(Self { redis })
    }

    /// Wraps an existing connection manager.
    ///
    /// Useful when sharing one connection across several queues.
    pub fn from_connection(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// Returns the underlying connection manager.
    pub fn connection(&self) -> &ConnectionManager {
        &self.redis
    }
}

#[async_trait]
impl ListStore for RedisStore {
    async fn push_tail(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut conn = self.redis.clone();
        conn.lpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn pop_head_push_tail(
        &self,
        src: &str,
        dst: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let mut conn = self.redis.clone();
        let moved: Option<Vec<u8>> = conn.rpoplpush(src, dst).await?;
        Ok(moved)
    }

    async fn remove_occurrences(
        &self,
        key: &str,
        value: &[u8],
        count: usize,
    ) -> Result<usize, StoreError> {
        // LREM treats 0 as "remove all"; a zero count here means remove nothing.
        if count == 0 {
            return Ok(0);
        }

        let count = isize::try_from(count).unwrap_or(isize::MAX);
        let mut conn = self.redis.clone();
        let removed: usize = conn.lrem(key, count, value).await?;
        Ok(removed)
    }

    async fn len(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.redis.clone();
        let len: usize = conn.llen(key).await?;
        Ok(len)
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(keys).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        // The multiplexed connection shuts down once its last clone is dropped.
        debug!("releasing redis connection");
        Ok(())
    }
}
