//! Reliable work queue over two store lists.
//!
//! # Queue Structure
//!
//! Every queue owns two lists in the backing store:
//!
//! - `{name}_main`: pending tasks, oldest at the head
//! - `{name}_processing`: tasks handed to a consumer and not yet acknowledged
//!
//! # Reliability
//!
//! `dequeue` moves a task from pending to processing in a single atomic store
//! command, so no observer ever sees it in neither list or in both. The queue
//! remembers the last task it dequeued (the in-flight handle) and
//! `acknowledge` removes exactly one copy of those bytes from processing.
//!
//! There is no redelivery: a task that is dequeued and never acknowledged
//! (consumer crash, or a second `dequeue` overwriting the handle) stays in
//! the processing list until an operator deals with it.
//!
//! # Cancellation
//!
//! Each store round-trip races the queue's `CancellationToken` (and the
//! optional operation timeout). If the token fires before the command is
//! sent, nothing happens in the store. If it fires while the command is in
//! flight, the store may already have applied it even though the caller sees
//! `QueueError::Cancelled`; for `dequeue` that means the task can sit in
//! processing without this instance holding a handle for it. Dropping an
//! operation's future behaves the same way.

use std::future::Future;
use std::time::Duration;

use redis::aio::ConnectionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::QueueConfig;
use crate::error::{QueueError, QueueResult, StoreError};
use crate::payload::Payload;
use crate::store::{ListStore, RedisStore};

/// Suffix of the pending list key.
const PENDING_SUFFIX: &str = "_main";

/// Suffix of the processing list key.
const PROCESSING_SUFFIX: &str = "_processing";

/// A reliable FIFO work queue with a single in-flight slot.
///
/// Mutating operations take `&mut self`; share a queue between tasks by
/// giving each consumer its own instance over a cloned store.
pub struct ReliableQueue<S: ListStore = RedisStore> {
    /// Backing list store.
    store: S,
    /// Queue name.
    name: String,
    /// Key of the pending list.
    pending_key: String,
    /// Key of the processing list.
    processing_key: String,
    /// Bytes of the last dequeued, unacknowledged task.
    in_flight: Option<Vec<u8>>,
    /// Cancels in-flight store commands; fired by `close`.
    cancel: CancellationToken,
    /// Outside token that also cancels store commands; never fired by the queue.
    parent: Option<CancellationToken>,
    /// Upper bound for a single store round-trip.
    operation_timeout: Option<Duration>,
}

impl ReliableQueue<RedisStore> {
    /// Connects to Redis and creates a queue.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `name` - Queue name (used as prefix for the two list keys)
    ///
    /// # Errors
    ///
    /// Returns `QueueError::StoreCommunication` if the connection fails.
    pub async fn connect(redis_url: &str, name: &str) -> QueueResult<Self> {
        let store = RedisStore::connect(redis_url).await?;
        Ok(Self::with_store(store, name))
    }

    /// Validates `config`, connects to Redis and applies the configured timeout.
    pub async fn from_config(config: &QueueConfig) -> QueueResult<Self> {
        config.validate()?;

        let mut queue = Self::connect(&config.redis_url, &config.queue_name).await?;
        queue.operation_timeout = config.operation_timeout;
        Ok(queue)
    }

    /// Creates a queue from an existing ConnectionManager.
    ///
    /// Useful when sharing a connection across multiple components.
    pub fn from_connection(redis: ConnectionManager, name: &str) -> Self {
        Self::with_store(RedisStore::from_connection(redis), name)
    }
}

impl<S: ListStore> ReliableQueue<S> {
    /// Creates a queue named `name` on top of `store`.
    pub fn with_store(store: S, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            store,
            pending_key: format!("{}{}", name, PENDING_SUFFIX),
            processing_key: format!("{}{}", name, PROCESSING_SUFFIX),
            name,
            in_flight: None,
            cancel: CancellationToken::new(),
            parent: None,
            operation_timeout: None,
        }
    }

    /// Bounds every store round-trip by `timeout`.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Ties this queue to `parent`: cancelling the parent cancels the queue.
    ///
    /// The queue keeps its own token, so handles returned earlier by
    /// [`cancellation_token`](Self::cancellation_token) still work. Closing
    /// the queue does not cancel the parent. A later call replaces the parent.
    pub fn with_cancellation(mut self, parent: &CancellationToken) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    /// Returns the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the key of the pending list (`<name>_main`).
    pub fn pending_key(&self) -> &str {
        &self.pending_key
    }

    /// Returns the key of the processing list (`<name>_processing`).
    pub fn processing_key(&self) -> &str {
        &self.processing_key
    }

    /// Returns the bytes `acknowledge` would remove, if any.
    pub fn in_flight(&self) -> Option<&[u8]> {
        self.in_flight.as_deref()
    }

    /// Returns a handle that cancels this queue's store operations.
    ///
    /// The handle is not cancelled when a parent given to
    /// [`with_cancellation`](Self::with_cancellation) fires.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Enqueues raw bytes, text, or a `serde_json::Value`.
    ///
    /// Bytes and text are stored unchanged; a JSON value is stored as its
    /// encoding. The task goes to the tail of the pending list.
    #[instrument(level = "debug", skip_all, fields(queue = %self.name))]
    pub async fn enqueue(&self, payload: impl Into<Payload>) -> QueueResult<()> {
        let bytes = payload.into().into_bytes()?;
        self.push(bytes).await
    }

    /// Serializes `value` to JSON and enqueues it.
    #[instrument(level = "debug", skip_all, fields(queue = %self.name))]
    pub async fn enqueue_json<T: Serialize + ?Sized>(&self, value: &T) -> QueueResult<()> {
        let bytes = serde_json::to_vec(value).map_err(QueueError::Serialization)?;
        self.push(bytes).await
    }

    async fn push(&self, bytes: Vec<u8>) -> QueueResult<()> {
        self.run(self.store.push_tail(&self.pending_key, &bytes))
            .await?;
        debug!(bytes = bytes.len(), "task enqueued");
        Ok(())
    }

    /// Moves the oldest pending task to processing and returns its bytes.
    ///
    /// The task becomes this instance's in-flight handle, replacing any task
    /// that was dequeued earlier and not acknowledged. The replaced task
    /// stays in the processing list and can no longer be acknowledged here.
    ///
    /// # Errors
    ///
    /// - `QueueError::EmptyQueue` if nothing is pending (state unchanged)
    /// - `QueueError::StoreCommunication` if the store cannot be reached
    #[instrument(level = "debug", skip_all, fields(queue = %self.name))]
    pub async fn dequeue(&mut self) -> QueueResult<Vec<u8>> {
        let moved = self
            .run(
                self.store
                    .pop_head_push_tail(&self.pending_key, &self.processing_key),
            )
            .await?;

        let Some(task) = moved else {
            return Err(QueueError::EmptyQueue {
                queue: self.name.clone(),
            });
        };

        if let Some(previous) = self.in_flight.replace(task.clone()) {
            warn!(
                queue = %self.name,
                abandoned_bytes = previous.len(),
                "dequeued again before acknowledging; previous task stays in processing"
            );
        }

        debug!(bytes = task.len(), "task moved to processing");
        Ok(task)
    }

    /// Dequeues a task and decodes it from JSON.
    ///
    /// The task is in processing and held as the in-flight handle even when
    /// decoding fails, so it can still be acknowledged.
    pub async fn dequeue_into<T: DeserializeOwned>(&mut self) -> QueueResult<T> {
        let task = self.dequeue().await?;
        serde_json::from_slice(&task).map_err(QueueError::Deserialization)
    }

    /// Removes the in-flight task from the processing list.
    ///
    /// Exactly one copy of the handle's bytes is removed, even if other
    /// consumers hold byte-identical tasks.
    ///
    /// # Errors
    ///
    /// - `QueueError::NothingToAcknowledge` if there is no in-flight task;
    ///   the store is not contacted
    /// - `QueueError::StoreCommunication` if the store cannot be reached; the
    ///   handle is kept so the call can be retried
    #[instrument(level = "debug", skip_all, fields(queue = %self.name))]
    pub async fn acknowledge(&mut self) -> QueueResult<()> {
        let Some(task) = self.in_flight.as_deref() else {
            return Err(QueueError::NothingToAcknowledge {
                queue: self.name.clone(),
            });
        };

        let removed = self
            .run(self.store.remove_occurrences(&self.processing_key, task, 1))
            .await?;

        if removed == 0 {
            warn!(
                queue = %self.name,
                "acknowledged task was no longer in the processing list"
            );
        }

        self.in_flight = None;
        debug!("task acknowledged");
        Ok(())
    }

    /// Returns the number of pending tasks.
    pub async fn len(&self) -> QueueResult<usize> {
        self.run(self.store.len(&self.pending_key)).await
    }

    /// Returns the number of tasks in processing, across all consumers.
    pub async fn processing_len(&self) -> QueueResult<usize> {
        self.run(self.store.len(&self.processing_key)).await
    }

    /// Returns whether the pending list is empty.
    pub async fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Returns queue statistics.
    pub async fn stats(&self) -> QueueResult<QueueStats> {
        let (pending, processing) = tokio::try_join!(self.len(), self.processing_len())?;

        Ok(QueueStats {
            queue_name: self.name.clone(),
            pending,
            processing,
        })
    }

    /// Deletes both lists and forgets the in-flight handle.
    ///
    /// **Warning**: this drops every pending and in-flight task of the queue,
    /// including those held by other consumers.
    #[instrument(level = "debug", skip_all, fields(queue = %self.name))]
    pub async fn clear(&mut self) -> QueueResult<()> {
        let keys = [self.pending_key.as_str(), self.processing_key.as_str()];
        self.run(self.store.delete(&keys)).await?;
        self.in_flight = None;
        debug!("queue cleared");
        Ok(())
    }

    /// Cancels outstanding operations and releases the store connection.
    pub async fn close(self) -> QueueResult<()> {
        self.cancel.cancel();

        if self.in_flight.is_some() {
            debug!(queue = %self.name, "closing with an unacknowledged task");
        }

        self.store.close().await?;
        Ok(())
    }

    /// Runs one store command under the cancellation token and timeout.
    async fn run<T, F>(&self, op: F) -> QueueResult<T>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let bounded = async {
            match self.operation_timeout {
                Some(limit) => match tokio::time::timeout(limit, op).await {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::Timeout(limit)),
                },
                None => op.await,
            }
        };

        let parent_cancelled = async {
            match &self.parent {
                Some(parent) => parent.cancelled().await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(QueueError::Cancelled),
            _ = parent_cancelled => Err(QueueError::Cancelled),
            result = bounded => Ok(result?),
        }
    }
}

/// Statistics about queue state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Name of the queue.
    pub queue_name: String,
    /// Number of tasks waiting to be dequeued.
    pub pending: usize,
    /// Number of tasks dequeued and not yet acknowledged.
    pub processing: usize,
}

impl QueueStats {
    /// Returns the total number of tasks in both lists.
    pub fn total(&self) -> usize {
        self.pending + self.processing
    }
}
