//! # PostgreSQL Message Queue Client (pgmq-rs)
//!
//! Rust client wrapping the pgmq-rs crate for the worker's queue operations:
//! long-poll receive and explicit delete. PGMQ has no server-side wait
//! parameter, so the long poll is realised client-side as a bounded read
//! loop with a short sleep between attempts.

use std::time::Duration;

use async_trait::async_trait;
use pgmq::PGMQueue;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{errors::MessagingError, MessageQueue, QueueMessage};
use crate::config::QueueSettings;

/// pgmq-rs based queue client.
#[derive(Debug, Clone)]
pub struct PgmqClient {
    pgmq: PGMQueue,
    visibility_timeout_seconds: i32,
    poll_interval: Duration,
}

impl PgmqClient {
    /// Create a new pgmq client from a connection string.
    pub async fn new(database_url: &str) -> Result<Self, MessagingError> {
        info!("Connecting to pgmq");

        let pgmq = PGMQueue::new(database_url.to_string())
            .await
            .map_err(|e| MessagingError::database_connection(e.to_string()))?;

        info!("Connected to pgmq");
        Ok(Self {
            pgmq,
            visibility_timeout_seconds: QueueSettings::default().visibility_timeout_seconds,
            poll_interval: Duration::from_millis(QueueSettings::default().poll_interval_ms),
        })
    }

    /// Create a new pgmq client from an existing connection pool.
    pub async fn new_with_pool(pool: sqlx::PgPool) -> Self {
        info!("Creating pgmq client with shared connection pool");

        let pgmq = PGMQueue::new_with_pool(pool).await;

        Self {
            pgmq,
            visibility_timeout_seconds: QueueSettings::default().visibility_timeout_seconds,
            poll_interval: Duration::from_millis(QueueSettings::default().poll_interval_ms),
        }
    }

    /// Apply visibility timeout and poll interval from configuration.
    pub fn with_queue_settings(mut self, settings: &QueueSettings) -> Self {
        self.visibility_timeout_seconds = settings.visibility_timeout_seconds;
        self.poll_interval = Duration::from_millis(settings.poll_interval_ms);
        self
    }

    /// Create the queue if it does not exist. Creation errors are downgraded
    /// to a debug log since the common cause is the queue already existing.
    pub async fn ensure_queue_exists(&self, queue_name: &str) {
        debug!(queue = %queue_name, "Ensuring queue exists");

        if let Err(e) = self.pgmq.create(queue_name).await {
            debug!(queue = %queue_name, error = %e, "Queue may already exist");
        }
    }
}

#[async_trait]
impl MessageQueue for PgmqClient {
    async fn receive(
        &self,
        queue_name: &str,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, MessagingError> {
        let deadline = Instant::now() + wait;

        loop {
            let batch = self
                .pgmq
                .read_batch::<serde_json::Value>(
                    queue_name,
                    Some(self.visibility_timeout_seconds),
                    1,
                )
                .await
                .map_err(|e| {
                    MessagingError::queue_operation(queue_name, "read", e.to_string())
                })?;

            if let Some(message) = batch.unwrap_or_default().into_iter().next() {
                debug!(
                    queue = %queue_name,
                    msg_id = message.msg_id,
                    read_ct = message.read_ct,
                    "Read message from queue"
                );
                return Ok(Some(QueueMessage {
                    msg_id: message.msg_id,
                    body: message.message,
                    read_ct: message.read_ct,
                    enqueued_at: message.enqueued_at,
                }));
            }

            if Instant::now() + self.poll_interval > deadline {
                return Ok(None);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn delete(&self, queue_name: &str, msg_id: i64) -> Result<(), MessagingError> {
        debug!(queue = %queue_name, msg_id = msg_id, "Deleting message from queue");

        self.pgmq
            .delete(queue_name, msg_id)
            .await
            .map_err(|e| MessagingError::queue_operation(queue_name, "delete", e.to_string()))?;

        Ok(())
    }
}
