//! Error types for queue operations.
//!
//! - `QueueError`: everything a `ReliableQueue` operation can fail with
//! - `StoreError`: failures talking to the backing list store

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors returned by the backing list store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open a connection to the store.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Redis command failed.
    #[error("Redis operation failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// The command did not complete within the configured timeout.
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The connection was already closed.
    #[error("Store connection is closed")]
    Closed,

    /// The store refused the command (used by the in-memory store to simulate outages).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur during queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A structured payload could not be encoded as JSON.
    #[error("Serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A dequeued payload could not be decoded into the requested type.
    #[error("Deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Dequeue found no pending tasks.
    #[error("Queue '{queue}' is empty")]
    EmptyQueue { queue: String },

    /// Acknowledge was called without an outstanding dequeued task.
    #[error("No task to acknowledge on queue '{queue}'")]
    NothingToAcknowledge { queue: String },

    /// Any failure reaching or receiving from the backing store.
    #[error("Store communication failed: {0}")]
    StoreCommunication(#[from] StoreError),

    /// The queue's cancellation token fired before the store replied.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid queue configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl QueueError {
    /// Returns true for `EmptyQueue`.
    pub fn is_empty_queue(&self) -> bool {
        matches!(self, Self::EmptyQueue { .. })
    }

    /// Returns true for `NothingToAcknowledge`.
    pub fn is_nothing_to_acknowledge(&self) -> bool {
        matches!(self, Self::NothingToAcknowledge { .. })
    }

    /// Returns true when the store could not be reached or answered with an error.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::StoreCommunication(_))
    }
}

impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        Self::StoreCommunication(StoreError::Redis(err))
    }
}
