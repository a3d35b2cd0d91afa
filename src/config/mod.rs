//! # Worker Configuration
//!
//! Layered configuration loading: built-in defaults, an optional TOML file
//! named by `SITE_WORKER_CONFIG`, then `SITE_WORKER_*` environment overrides.
//! All tunables the dispatch loop depends on live here so nothing is
//! hardcoded at the call sites.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use site_worker::config::WorkerConfig;
//!
//! # fn main() -> site_worker::Result<()> {
//! let config = WorkerConfig::load()?;
//! let queue_name = &config.queue.name;
//! let wait = config.queue.wait_time_seconds;
//! # Ok(())
//! # }
//! ```

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::dispatch::command::OP_INVOKE_ACTION;
use crate::error::WorkerError;

/// Root worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerConfig {
    /// PostgreSQL connection string for the PGMQ-backed queue.
    pub database_url: String,

    /// Queue polling settings.
    #[serde(default)]
    pub queue: QueueSettings,

    /// External runner invocation settings.
    #[serde(default)]
    pub invocation: InvocationSettings,

    /// The `(op, action)` routing table rows.
    #[serde(default = "default_operations")]
    pub operations: Vec<OperationRow>,
}

/// Settings for the queue client and the poll cycle.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueSettings {
    /// Queue to poll for commands.
    pub name: String,
    /// Long-poll window per receive call (seconds).
    pub wait_time_seconds: u64,
    /// Sleep between read attempts inside the long-poll window (milliseconds).
    pub poll_interval_ms: u64,
    /// Visibility timeout applied to read messages (seconds).
    pub visibility_timeout_seconds: i32,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            name: "site_commands".to_string(),
            wait_time_seconds: 20,
            poll_interval_ms: 250,
            visibility_timeout_seconds: 300, // 5 minutes
        }
    }
}

/// Settings for external runner invocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvocationSettings {
    /// Maximum runtime for one runner invocation (seconds). The child is
    /// killed when the timeout expires.
    pub timeout_seconds: u64,
}

impl Default for InvocationSettings {
    fn default() -> Self {
        Self {
            timeout_seconds: 3600, // simulations are long-running
        }
    }
}

/// One row of the operation routing table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct OperationRow {
    /// Operation tag matched against the command `op` field.
    pub op: String,
    /// Action tag matched against the command `action` field, when present.
    pub action: Option<String>,
    /// Program to invoke for this row.
    pub program: String,
    /// Fixed leading arguments; the serialized payload is appended last.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Default routing table: the two site operations.
fn default_operations() -> Vec<OperationRow> {
    vec![
        OperationRow {
            op: OP_INVOKE_ACTION.to_string(),
            action: Some("runSite".to_string()),
            program: "python3".to_string(),
            args: vec!["runners/step_simulation.py".to_string()],
        },
        OperationRow {
            op: OP_INVOKE_ACTION.to_string(),
            action: Some("addSite".to_string()),
            program: "python3".to_string(),
            args: vec!["runners/add_site.py".to_string()],
        },
    ]
}

impl WorkerConfig {
    /// Load configuration from defaults, optional TOML file, and environment.
    pub fn load() -> Result<Self, WorkerError> {
        let config = Self::build_sources()
            .map_err(|e| WorkerError::Configuration(format!("Failed to load config: {e}")))?;

        let worker_config: WorkerConfig = config
            .try_deserialize()
            .map_err(|e| WorkerError::Configuration(format!("Invalid config: {e}")))?;

        if worker_config.database_url.is_empty() {
            return Err(WorkerError::Configuration(
                "database_url is required (set DATABASE_URL or SITE_WORKER_DATABASE_URL)"
                    .to_string(),
            ));
        }

        Ok(worker_config)
    }

    fn build_sources() -> Result<Config, config::ConfigError> {
        let mut builder = Config::builder().set_default(
            "database_url",
            std::env::var("DATABASE_URL").unwrap_or_default(),
        )?;

        if let Ok(path) = std::env::var("SITE_WORKER_CONFIG") {
            builder = builder.add_source(File::with_name(&path));
        }

        builder = builder.add_source(Environment::with_prefix("SITE_WORKER").separator("__"));

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: WorkerConfig = serde_json::from_value(json!({
            "database_url": "postgres://localhost/site_worker"
        }))
        .unwrap();

        assert_eq!(config.queue.name, "site_commands");
        assert_eq!(config.queue.wait_time_seconds, 20);
        assert_eq!(config.queue.visibility_timeout_seconds, 300);
        assert_eq!(config.invocation.timeout_seconds, 3600);
        assert_eq!(config.operations.len(), 2);
    }

    #[test]
    fn default_table_covers_both_site_operations() {
        let rows = default_operations();
        assert!(rows
            .iter()
            .any(|row| row.action.as_deref() == Some("runSite")));
        assert!(rows
            .iter()
            .any(|row| row.action.as_deref() == Some("addSite")));
        assert!(rows.iter().all(|row| row.op == "InvokeAction"));
    }

    #[test]
    fn explicit_rows_replace_the_default_table() {
        let config: WorkerConfig = serde_json::from_value(json!({
            "database_url": "postgres://localhost/site_worker",
            "operations": [
                {"op": "InvokeAction", "action": "removeSite", "program": "/usr/bin/remove-site"}
            ]
        }))
        .unwrap();

        assert_eq!(config.operations.len(), 1);
        assert_eq!(config.operations[0].program, "/usr/bin/remove-site");
        assert!(config.operations[0].args.is_empty());
    }
}
