//! # External Process Invocation
//!
//! Runners are separate programs invoked with the serialized command payload
//! as their final argument. Invocation is synchronous from the loop's point
//! of view but bounded: a configurable timeout kills runaway children so one
//! hung runner cannot stall the consumer forever.
//!
//! Runner stdout/stderr are inherited from the worker process; there is no
//! structured result protocol. The exit status is captured and surfaced so
//! the loop can at least log non-zero exits.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command as ProcessCommand;
use tracing::debug;

use super::registry::InvocationSpec;

/// Errors from spawning or waiting on a runner process.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting on {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invocation of {program} timed out after {timeout_seconds}s")]
    Timeout {
        program: String,
        timeout_seconds: u64,
    },
}

/// Result of a completed runner invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    /// Process exit code; -1 when the process was terminated by a signal.
    pub exit_code: i32,
    pub duration_ms: u64,
}

/// Seam between the dispatch loop and process execution, so loop tests can
/// record invocations instead of spawning anything.
#[async_trait]
pub trait CommandInvoker: Send + Sync {
    async fn invoke(
        &self,
        spec: &InvocationSpec,
        payload: &str,
    ) -> Result<InvocationOutcome, InvocationError>;
}

/// Real invoker: spawns the runner via `tokio::process` with a bounded
/// timeout. `kill_on_drop` ensures a timed-out child is killed rather than
/// orphaned.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    timeout: Duration,
}

impl ProcessInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandInvoker for ProcessInvoker {
    async fn invoke(
        &self,
        spec: &InvocationSpec,
        payload: &str,
    ) -> Result<InvocationOutcome, InvocationError> {
        debug!(
            program = %spec.program,
            args = ?spec.args,
            "Invoking runner"
        );

        let mut command = ProcessCommand::new(&spec.program);
        command.args(&spec.args).arg(payload).kill_on_drop(true);

        let start = Instant::now();

        let mut child = command.spawn().map_err(|source| InvocationError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(Ok(status)) => Ok(InvocationOutcome {
                exit_code: status.code().unwrap_or(-1),
                duration_ms: start.elapsed().as_millis() as u64,
            }),
            Ok(Err(source)) => Err(InvocationError::Wait {
                program: spec.program.clone(),
                source,
            }),
            // The child is dropped here and killed via kill_on_drop.
            Err(_elapsed) => Err(InvocationError::Timeout {
                program: spec.program.clone(),
                timeout_seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(program: &str, args: &[&str]) -> InvocationSpec {
        InvocationSpec {
            program: program.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn captures_zero_exit_code() {
        let invoker = ProcessInvoker::new(Duration::from_secs(5));
        let outcome = invoker.invoke(&spec("true", &[]), "{}").await.unwrap();
        assert_eq!(outcome.exit_code, 0);
    }

    #[tokio::test]
    async fn captures_nonzero_exit_code() {
        let invoker = ProcessInvoker::new(Duration::from_secs(5));
        let outcome = invoker
            .invoke(&spec("sh", &["-c", "exit 3", "sh"]), "{}")
            .await
            .unwrap();
        assert_eq!(outcome.exit_code, 3);
    }

    #[tokio::test]
    async fn passes_payload_as_final_argument() {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("payload.json");
        let script = format!("printf '%s' \"$1\" > {}", out_path.display());

        let invoker = ProcessInvoker::new(Duration::from_secs(5));
        let payload = r#"{"op":"InvokeAction","action":"runSite","site_id":"A1"}"#;
        let outcome = invoker
            .invoke(&spec("sh", &["-c", &script, "sh"]), payload)
            .await
            .unwrap();

        assert_eq!(outcome.exit_code, 0);
        let written = std::fs::read_to_string(&out_path).unwrap();
        assert_eq!(written, payload);
    }

    #[tokio::test]
    async fn times_out_and_kills_hung_runner() {
        let invoker = ProcessInvoker::new(Duration::from_millis(100));
        let result = invoker.invoke(&spec("sleep", &["30"]), "{}").await;
        assert!(matches!(result, Err(InvocationError::Timeout { .. })));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let invoker = ProcessInvoker::new(Duration::from_secs(1));
        let result = invoker
            .invoke(&spec("/nonexistent/runner", &[]), "{}")
            .await;
        assert!(matches!(result, Err(InvocationError::Spawn { .. })));
    }
}
