//! In-process list store.
//!
//! Every clone is a separate "connection" to the same lists, so several
//! queues can share state the way they would share a Redis server. Closing
//! one clone does not affect the others.
//!
//! For tests, `fail_next` makes the next commands fail with
//! `StoreError::Unavailable`, across all clones.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ListStore;
use crate::error::StoreError;

type Lists = HashMap<String, VecDeque<Vec<u8>>>;

/// List store kept in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    lists: Arc<Mutex<Lists>>,
    pending_failures: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `commands` store commands fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, commands: usize) {
        self.pending_failures.store(commands, Ordering::SeqCst);
    }

    /// Returns a copy of the list at `key`, head first.
    pub async fn snapshot(&self, key: &str) -> Vec<Vec<u8>> {
        self.lists
            .lock()
            .await
            .get(key)
            .map(|list| list.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns true once `close` was called on this handle.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }

        let injected = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if injected.is_ok() {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }

        Ok(())
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            lists: Arc::clone(&self.lists),
            pending_failures: Arc::clone(&self.pending_failures),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn push_tail(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.check()?;
        let mut lists = self.lists.lock().await;
        lists.entry(key.to_string()).or_default().push_back(value.to_vec());
        Ok(())
    }

    async fn pop_head_push_tail(
        &self,
        src: &str,
        dst: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        self.check()?;
        let mut lists = self.lists.lock().await;

        let Some(value) = lists.get_mut(src).and_then(VecDeque::pop_front) else {
            return Ok(None);
        };
        if lists.get(src).is_some_and(VecDeque::is_empty) {
            lists.remove(src);
        }

        lists.entry(dst.to_string()).or_default().push_back(value.clone());
        Ok(Some(value))
    }

    async fn remove_occurrences(
        &self,
        key: &str,
        value: &[u8],
        count: usize,
    ) -> Result<usize, StoreError> {
        self.check()?;
        let mut lists = self.lists.lock().await;

        let Some(list) = lists.get_mut(key) else {
            return Ok(0);
        };

        let mut removed = 0;
        list.retain(|item| {
            if removed < count && item.as_slice() == value {
                removed += 1;
                false
            } else {
                true
            }
        });

        if list.is_empty() {
            lists.remove(key);
        }
        Ok(removed)
    }

    async fn len(&self, key: &str) -> Result<usize, StoreError> {
        self.check()?;
        Ok(self.lists.lock().await.get(key).map_or(0, VecDeque::len))
    }

    async fn delete(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.check()?;
        let mut lists = self.lists.lock().await;
        for key in keys {
            lists.remove(*key);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
