use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::ExecutionResult;

/// Errors that can occur while running an external command
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Invalid command invocation: {0}")]
    InvalidInvocation(String),

    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not successfully execute command '{command}'\n{output}exit_code = {exit_code}")]
    CommandFailed {
        command: String,
        output: String,
        exit_code: i32,
    },

    #[error("TIMEOUT[{timeout_secs}]! Could not successfully execute command '{command}'")]
    Timeout {
        command: String,
        argv: Vec<String>,
        timeout_secs: u64,
        /// Whatever the process flushed before it was terminated
        partial_output: String,
    },

    #[error("Capture sink error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecError {
    /// Diagnostic text captured from the tool, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            ExecError::CommandFailed { output, .. } => Some(output),
            ExecError::Timeout { partial_output, .. } => Some(partial_output),
            _ => None,
        }
    }

    /// Exit code of a command that ran to completion and failed
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::CommandFailed { exit_code, .. } => Some(*exit_code),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout { .. })
    }
}

/// One call to an external program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Program followed by its arguments
    pub argv: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout_secs: u64,
    /// Additional environment variables
    pub env_vars: Vec<(String, String)>,
}

impl CommandInvocation {
    pub fn new<I, S>(argv: I, working_dir: impl Into<PathBuf>, timeout_secs: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            working_dir: working_dir.into(),
            timeout_secs,
            env_vars: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// The command line as a single string, for logs and error messages
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }

    pub(crate) fn validate(&self) -> Result<(), ExecError> {
        if self.argv.is_empty() {
            return Err(ExecError::InvalidInvocation(
                "argument vector is empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ExecError::InvalidInvocation(format!(
                "timeout must be positive for '{}'",
                self.command_line()
            )));
        }
        Ok(())
    }
}

/// Runs external commands to completion.
///
/// Implementations must wait for the process (or its timeout) before
/// returning and must only return `Ok` for a zero exit status.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<ExecutionResult, ExecError>;
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for std::sync::Arc<E> {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<ExecutionResult, ExecError> {
        (**self).execute(invocation).await
    }
}

#[async_trait]
impl<E: Executor + ?Sized> Executor for Box<E> {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<ExecutionResult, ExecError> {
        (**self).execute(invocation).await
    }
}
