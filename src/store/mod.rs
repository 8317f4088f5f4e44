//! Backing list store.
//!
//! A `ReliableQueue` only ever talks to its store through `ListStore`: a
//! handful of single round-trip, individually atomic list commands keyed by
//! string. Two implementations ship with the crate:
//!
//! - **RedisStore**: Redis over a multiplexed `ConnectionManager`
//! - **MemoryStore**: in-process lists for tests and local development
//!
//! Lists are ordered from *head* (oldest) to *tail* (newest). How an
//! implementation lays that out internally is its own business, as long as
//! `push_tail` followed by `pop_head_push_tail` yields FIFO order.

pub mod memory;
pub mod redis;

use async_trait::async_trait;

use crate::error::StoreError;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Ordered lists of byte strings under string keys.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Appends `value` to the tail of the list at `key`, creating it if needed.
    async fn push_tail(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Atomically removes the head of `src` and appends it to the tail of `dst`.
    ///
    /// Returns `None` when `src` is empty.
    async fn pop_head_push_tail(&self, src: &str, dst: &str)
        -> Result<Option<Vec<u8>>, StoreError>;

    /// Removes up to `count` elements byte-equal to `value`.
    ///
    /// Returns the number of elements removed.
    async fn remove_occurrences(
        &self,
        key: &str,
        value: &[u8],
        count: usize,
    ) -> Result<usize, StoreError>;

    /// Returns the length of the list at `key` (0 if missing).
    async fn len(&self, key: &str) -> Result<usize, StoreError>;

    /// Deletes every list in `keys` in one command; either all go or none do.
    async fn delete(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Releases the connection.
    async fn close(&self) -> Result<(), StoreError>;
}
