//! # Worker Error Types
//!
//! Per-stage error classification for the dispatch loop. Each stage of a
//! poll cycle (receive, decode, delete, invocation) gets its own variant so
//! the loop can report what failed instead of collapsing everything into a
//! single message. The loop continues on all of them; classification only
//! changes what gets logged.

use thiserror::Error;

use crate::dispatch::invoker::InvocationError;
use crate::messaging::MessagingError;

/// Errors surfaced by the worker, classified by the stage that produced them.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Queue client startup failed: {source}")]
    Startup {
        #[source]
        source: MessagingError,
    },

    #[error("Queue receive failed: {source}")]
    Receive {
        #[source]
        source: MessagingError,
    },

    #[error("Message decode failed for msg_id {msg_id}: {message}")]
    Decode { msg_id: i64, message: String },

    #[error("Message delete failed for msg_id {msg_id}: {source}")]
    Delete {
        msg_id: i64,
        #[source]
        source: MessagingError,
    },

    #[error("Runner invocation failed for {operation}: {source}")]
    Invocation {
        operation: String,
        #[source]
        source: InvocationError,
    },
}

impl WorkerError {
    /// Short stage tag for structured log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            WorkerError::Configuration(_) => "configuration",
            WorkerError::Startup { .. } => "startup",
            WorkerError::Receive { .. } => "receive",
            WorkerError::Decode { .. } => "decode",
            WorkerError::Delete { .. } => "delete",
            WorkerError::Invocation { .. } => "invocation",
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_tags_match_variants() {
        let decode = WorkerError::Decode {
            msg_id: 7,
            message: "missing field `op`".to_string(),
        };
        assert_eq!(decode.stage(), "decode");
        assert_eq!(
            decode.to_string(),
            "Message decode failed for msg_id 7: missing field `op`"
        );

        let config = WorkerError::Configuration("database_url is required".to_string());
        assert_eq!(config.stage(), "configuration");
    }
}
