//! # hgctl-exec
//!
//! Process execution for hgctl.
//!
//! Every call to the version-control tool goes through [`CommandExecutor`]:
//! it spawns the program, captures stdout and stderr into one temporary file,
//! waits up to the invocation's timeout and classifies the result.
//!
//! ## Key Types
//!
//! - [`Executor`] - Trait implemented by anything that can run a [`CommandInvocation`]
//! - [`CommandExecutor`] - The real process-backed executor
//! - [`ExecutionResult`] - Captured output and exit code of a successful run
//! - [`ExecError`] - Spawn failures, non-zero exits and timeouts
//! - [`DaemonHandle`] - Caller-owned handle to a long-running process
//!
//! ## Timeouts
//!
//! A process that outlives its timeout receives SIGTERM, then SIGKILL after
//! the executor's grace period, and is always reaped. Output flushed before
//! termination is kept on the error for diagnostics.

mod daemon;
mod executor;
mod output;
mod sink;
mod terminate;
mod traits;

pub use daemon::DaemonHandle;
pub use executor::{CommandExecutor, DEFAULT_GRACE_PERIOD};
pub use output::ExecutionResult;
pub use traits::{CommandInvocation, ExecError, Executor};
