//! # Site Worker
//!
//! A long-running consumer that polls a PGMQ-backed command queue and
//! dispatches each command to an external runner process. Producers enqueue
//! simulation requests; this worker decodes them, acknowledges them by
//! deleting them from the queue, and invokes the matching runner with the
//! full payload as its sole argument.
//!
//! ## Architecture
//!
//! - [`messaging`] - queue client: long-poll receive and explicit delete
//! - [`dispatch`] - command decoding, the `(op, action)` routing table, and
//!   external process invocation
//! - [`worker`] - the dispatch loop tying the two together, with
//!   per-iteration failure containment
//! - [`config`] - layered configuration (defaults, TOML file, environment)
//! - [`logging`] - tracing subscriber bootstrap
//!
//! ## Message lifecycle
//!
//! A message is deleted from the queue exactly once, immediately after the
//! decode attempt and before any dispatch logic runs. Deletion is not
//! conditioned on dispatch success: this is an at-most-once-attempt design
//! that trades message loss on runner failure for never invoking a runner
//! twice for the same message.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
pub use worker::{PollOutcome, Worker, WorkerSettings};
