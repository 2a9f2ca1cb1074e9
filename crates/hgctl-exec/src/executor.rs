use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::daemon::DaemonHandle;
use crate::sink::CaptureSink;
use crate::terminate::{isolate, terminate};
use crate::{CommandInvocation, ExecError, ExecutionResult, Executor};

/// How long a timed out process gets to exit after SIGTERM before it is killed
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Spawns external commands and waits for them within a bounded time
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    grace_period: Duration,
    capture_dir: Option<PathBuf>,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor {
    pub fn new() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            capture_dir: None,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Keep capture files in `dir` instead of the system temp dir
    pub fn with_capture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.capture_dir = Some(dir.into());
        self
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Run a command to completion and capture its combined output.
    ///
    /// Returns `CommandFailed` for a non-zero exit and `Timeout` when the
    /// process outlives `timeout_secs`. A timed out process is terminated
    /// together with everything it started, and reaped before this returns.
    pub async fn run(&self, invocation: &CommandInvocation) -> Result<ExecutionResult, ExecError> {
        invocation.validate()?;
        let command_line = invocation.command_line();

        debug!(
            command = %command_line,
            cwd = %invocation.working_dir.display(),
            "Executing command"
        );

        let start = Instant::now();
        let sink = CaptureSink::new_in(self.capture_dir.as_deref())?;
        let (stdout, stderr) = sink.stdio()?;

        let program = &invocation.argv[0];
        let mut cmd = Command::new(program);
        cmd.args(invocation.args())
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null()) // Non-interactive
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true);
        isolate(&mut cmd);

        for (key, value) in &invocation.env_vars {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|source| ExecError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

        let limit = Duration::from_secs(invocation.timeout_secs);
        let status = match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    command = %command_line,
                    timeout_secs = invocation.timeout_secs,
                    "Command timed out, terminating"
                );
                if let Err(e) = terminate(&mut child, self.grace_period).await {
                    warn!(error = %e, "Failed to reap timed out process");
                }
                let partial_output = sink.read().await.unwrap_or_default();
                return Err(ExecError::Timeout {
                    command: command_line,
                    argv: invocation.argv.clone(),
                    timeout_secs: invocation.timeout_secs,
                    partial_output,
                });
            }
        };

        let output = sink.read().await?;
        let duration = start.elapsed();
        let exit_code = status.code().unwrap_or(-1);

        trace!(
            exit_code,
            duration_ms = duration.as_millis() as u64,
            output_len = output.len(),
            "Command completed"
        );

        if !status.success() {
            return Err(ExecError::CommandFailed {
                command: command_line,
                output,
                exit_code,
            });
        }

        Ok(ExecutionResult::new(output, exit_code, duration))
    }

    /// Start a long-running command without waiting for it.
    ///
    /// Output is discarded. The returned handle owns the process.
    pub fn spawn_detached(&self, invocation: &CommandInvocation) -> Result<DaemonHandle, ExecError> {
        if invocation.argv.is_empty() {
            return Err(ExecError::InvalidInvocation(
                "argument vector is empty".to_string(),
            ));
        }
        let command_line = invocation.command_line();

        debug!(
            command = %command_line,
            cwd = %invocation.working_dir.display(),
            "Starting daemon"
        );

        let program = &invocation.argv[0];
        let mut cmd = Command::new(program);
        cmd.args(invocation.args())
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        isolate(&mut cmd);

        for (key, value) in &invocation.env_vars {
            cmd.env(key, value);
        }

        let child = cmd.spawn().map_err(|source| ExecError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

        Ok(DaemonHandle::new(child, command_line, self.grace_period))
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<ExecutionResult, ExecError> {
        self.run(invocation).await
    }
}
