use std::time::{Duration, Instant};
use tokio::process::Child;
use tracing::debug;

use crate::terminate::terminate;
use crate::ExecError;

/// Handle to a long-running process started with
/// [`CommandExecutor::spawn_detached`](crate::CommandExecutor::spawn_detached).
///
/// The process is killed if the handle is dropped while it is still running.
#[derive(Debug)]
pub struct DaemonHandle {
    child: Child,
    command: String,
    started_at: Instant,
    grace_period: Duration,
}

impl DaemonHandle {
    pub(crate) fn new(child: Child, command: String, grace_period: Duration) -> Self {
        Self {
            child,
            command,
            started_at: Instant::now(),
            grace_period,
        }
    }

    /// OS process id, `None` once the process has been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Exit code if the process has already finished
    pub fn try_wait(&mut self) -> Result<Option<i32>, ExecError> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| status.code().unwrap_or(-1)))
    }

    /// Wait for the process to exit on its own
    pub async fn wait(&mut self) -> Result<i32, ExecError> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    /// Terminate the process with the executor's grace period
    pub async fn shutdown(self) -> Result<i32, ExecError> {
        let grace = self.grace_period;
        self.shutdown_with_grace(grace).await
    }

    /// Request termination, kill after `grace`, and reap
    pub async fn shutdown_with_grace(mut self, grace: Duration) -> Result<i32, ExecError> {
        if let Some(code) = self.try_wait()? {
            return Ok(code);
        }
        let status = terminate(&mut self.child, grace).await?;
        debug!(
            command = %self.command,
            uptime_ms = self.uptime().as_millis() as u64,
            "Daemon stopped"
        );
        Ok(status.code().unwrap_or(-1))
    }
}
