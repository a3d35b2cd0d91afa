//! # Structured Logging Module
//!
//! Tracing subscriber bootstrap for the worker binary. Console output by
//! default; JSON output when `SITE_WORKER_LOG_FORMAT=json` is set, for
//! environments that ship logs to a collector.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; initialization happens on the first call
/// only. The filter comes from `RUST_LOG` when set, otherwise defaults to
/// `site_worker=info`.
pub fn init_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("site_worker=info"));

        let json_output = std::env::var("SITE_WORKER_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let initialized = if json_output {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(true))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .try_init()
        };

        // A global subscriber may already be set by a test harness; that is
        // not an error.
        if initialized.is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }
    });
}
