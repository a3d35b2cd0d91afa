//! # Messaging
//!
//! Queue client layer: durable, at-least-once delivery of commands from
//! producers to this worker. The concrete client wraps PGMQ; the
//! [`MessageQueue`] trait is the seam the dispatch loop depends on, so tests
//! can substitute an in-memory queue.

pub mod errors;
pub mod pgmq_client;

pub use errors::MessagingError;
pub use pgmq_client::PgmqClient;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One unit of work received from the queue.
///
/// `msg_id` is the receipt handle used for deletion; `body` is the opaque
/// JSON payload enqueued by the producer.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    pub msg_id: i64,
    pub body: serde_json::Value,
    pub read_ct: i32,
    pub enqueued_at: DateTime<Utc>,
}

/// Long-poll receive and explicit delete, the only queue operations the
/// dispatch loop needs.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Block up to `wait` for a message; `Ok(None)` on timeout, no error.
    /// Batch size is capped at one by design.
    async fn receive(
        &self,
        queue_name: &str,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, MessagingError>;

    /// Acknowledge and permanently remove a message. Called exactly once per
    /// message by the dispatch loop.
    async fn delete(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError>;
}
