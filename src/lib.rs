//! redqueue: a reliable work queue on Redis lists.
//!
//! Tasks wait in a pending list (`<name>_main`). `dequeue` moves the oldest
//! one atomically into a processing list (`<name>_processing`) and remembers
//! it; `acknowledge` removes it from there once the work is done.
//!
//! # Example
//!
//! ```rust,ignore
//! use redqueue::ReliableQueue;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Resize {
//!     id: u64,
//!     width: u32,
//! }
//!
//! let producer = ReliableQueue::connect("redis://localhost:6379", "thumbnails").await?;
//! producer.enqueue_json(&Resize { id: 1, width: 128 }).await?;
//!
//! let mut consumer = ReliableQueue::connect("redis://localhost:6379", "thumbnails").await?;
//! let job: Resize = consumer.dequeue_into().await?;
//! // ... do the work ...
//! consumer.acknowledge().await?;
//! consumer.close().await?;
//! ```
//!
//! Tasks that are dequeued and never acknowledged stay in the processing
//! list; this crate does not redeliver them.

pub mod cli;
pub mod config;
pub mod error;
pub mod payload;
pub mod queue;
pub mod store;

pub use config::{ConfigError, QueueConfig};
pub use error::{QueueError, QueueResult, StoreError};
pub use payload::Payload;
pub use queue::{QueueStats, ReliableQueue};
pub use store::{ListStore, MemoryStore, RedisStore};
