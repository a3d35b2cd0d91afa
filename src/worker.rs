//! # Dispatch Loop
//!
//! The worker's core: a single sequential loop that long-polls the queue,
//! decodes each message into a command, acknowledges it by deletion, routes
//! it through the operation registry, and invokes the matching runner.
//!
//! ## Message lifecycle
//!
//! Deletion happens exactly once per message, after the decode attempt and
//! before any dispatch logic, and is not conditioned on dispatch success.
//! Well-formed commands therefore get at-most-one processing attempt; a
//! malformed body is deleted too (a poison message never loops).
//!
//! ## Failure containment
//!
//! Every per-message error is classified ([`WorkerError`]), logged, and
//! swallowed; the loop never terminates on message-level faults. Processing
//! is strictly sequential: one poll, one message, one blocking (but bounded)
//! runner invocation.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::config::WorkerConfig;
use crate::dispatch::command::Command;
use crate::dispatch::invoker::CommandInvoker;
use crate::dispatch::registry::OperationRegistry;
use crate::error::{Result, WorkerError};
use crate::messaging::{MessageQueue, QueueMessage};

/// Loop-level settings, split out of [`WorkerConfig`] so tests can build a
/// worker without a full configuration.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Queue to poll for commands.
    pub queue_name: String,
    /// Long-poll window per receive call.
    pub wait_time: Duration,
    /// Pause after a receive error before polling again.
    pub poll_interval: Duration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            queue_name: "site_commands".to_string(),
            wait_time: Duration::from_secs(20),
            poll_interval: Duration::from_millis(250),
        }
    }
}

impl WorkerSettings {
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            queue_name: config.queue.name.clone(),
            wait_time: Duration::from_secs(config.queue.wait_time_seconds),
            poll_interval: Duration::from_millis(config.queue.poll_interval_ms),
        }
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The long poll returned no message.
    Empty,
    /// A message was routed and its runner invoked.
    Dispatched {
        msg_id: i64,
        op: String,
        action: Option<String>,
        exit_code: i32,
    },
    /// A message carried no registered `(op, action)` row; deleted and
    /// dropped without invoking anything.
    Dropped {
        msg_id: i64,
        op: String,
        action: Option<String>,
    },
}

/// The queue consumer: owns the routing table and drives the poll cycle.
pub struct Worker {
    queue: Arc<dyn MessageQueue>,
    invoker: Arc<dyn CommandInvoker>,
    registry: OperationRegistry,
    settings: WorkerSettings,
}

impl Worker {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        invoker: Arc<dyn CommandInvoker>,
        registry: OperationRegistry,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            queue,
            invoker,
            registry,
            settings,
        }
    }

    /// Run the dispatch loop. Never returns under normal operation;
    /// termination is external (process kill).
    pub async fn run(&self) {
        info!(
            queue = %self.settings.queue_name,
            operations = self.registry.len(),
            wait_time_seconds = self.settings.wait_time.as_secs(),
            "Worker loop started"
        );

        loop {
            match self.poll_once().await {
                Ok(PollOutcome::Empty) => {}
                Ok(outcome) => {
                    debug!(outcome = ?outcome, "Poll cycle complete");
                }
                Err(e) => {
                    error!(stage = e.stage(), error = %e, "Error while processing message");
                    // Avoid a tight error loop during broker outages.
                    if matches!(e, WorkerError::Receive { .. }) {
                        tokio::time::sleep(self.settings.poll_interval).await;
                    }
                }
            }
        }
    }

    /// One poll cycle: long-poll receive, then process at most one message.
    #[instrument(skip(self), fields(queue = %self.settings.queue_name))]
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        let message = self
            .queue
            .receive(&self.settings.queue_name, self.settings.wait_time)
            .await
            .map_err(|source| WorkerError::Receive { source })?;

        let Some(message) = message else {
            return Ok(PollOutcome::Empty);
        };

        info!(
            msg_id = message.msg_id,
            payload = %message.body,
            enqueued_at = %message.enqueued_at,
            read_ct = message.read_ct,
            "Message received"
        );

        self.process_message(message).await
    }

    /// Decode, acknowledge, route, and invoke for a single message.
    async fn process_message(&self, message: QueueMessage) -> Result<PollOutcome> {
        let msg_id = message.msg_id;

        // Decode first so the result is known, but acknowledge either way:
        // deletion is not conditioned on a valid command or on dispatch
        // success.
        let decoded = Command::decode(&message.body);

        self.queue
            .delete(&self.settings.queue_name, msg_id)
            .await
            .map_err(|source| WorkerError::Delete { msg_id, source })?;

        let command = decoded.map_err(|e| WorkerError::Decode {
            msg_id,
            message: e.to_string(),
        })?;

        let Some(spec) = self.registry.resolve(&command) else {
            debug!(
                msg_id,
                op = %command.op,
                action = ?command.action,
                "No handler registered, dropping message"
            );
            return Ok(PollOutcome::Dropped {
                msg_id,
                op: command.op,
                action: command.action,
            });
        };

        // The runner receives the full original body re-serialized as its
        // sole trailing argument.
        let payload = message.body.to_string();

        let outcome = self
            .invoker
            .invoke(spec, &payload)
            .await
            .map_err(|source| WorkerError::Invocation {
                operation: command.describe(),
                source,
            })?;

        if outcome.exit_code == 0 {
            debug!(
                msg_id,
                operation = %command.describe(),
                duration_ms = outcome.duration_ms,
                "Runner completed"
            );
        } else {
            warn!(
                msg_id,
                operation = %command.describe(),
                exit_code = outcome.exit_code,
                duration_ms = outcome.duration_ms,
                "Runner exited with non-zero status"
            );
        }

        Ok(PollOutcome::Dispatched {
            msg_id,
            op: command.op,
            action: command.action,
            exit_code: outcome.exit_code,
        })
    }
}
