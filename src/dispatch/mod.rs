//! # Command Dispatch
//!
//! Everything between a decoded queue message and a running external
//! process: the [`Command`] envelope, the `(op, action)` routing table, and
//! the process invoker.

pub mod command;
pub mod invoker;
pub mod registry;

pub use command::Command;
pub use invoker::{CommandInvoker, InvocationError, InvocationOutcome, ProcessInvoker};
pub use registry::{InvocationSpec, OperationKey, OperationRegistry};
