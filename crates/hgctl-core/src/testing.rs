//! Scripted executor for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use hgctl_exec::{CommandInvocation, ExecError, ExecutionResult, Executor};

/// Replays queued responses in order and records every invocation
pub(crate) struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<ExecutionResult, ExecError>>>,
    calls: Mutex<Vec<CommandInvocation>>,
}

impl ScriptedExecutor {
    pub(crate) fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn ok(self, output: &str) -> Self {
        self.push(Ok(ExecutionResult::new(
            output.to_string(),
            0,
            Duration::ZERO,
        )))
    }

    pub(crate) fn fail(self, output: &str, exit_code: i32) -> Self {
        self.push(Err(ExecError::CommandFailed {
            command: "hg".to_string(),
            output: output.to_string(),
            exit_code,
        }))
    }

    pub(crate) fn timeout(self) -> Self {
        self.push(Err(ExecError::Timeout {
            command: "hg".to_string(),
            argv: vec!["hg".to_string()],
            timeout_secs: 1,
            partial_output: String::new(),
        }))
    }

    fn push(self, response: Result<ExecutionResult, ExecError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Arguments of each call, without the program name
    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.args().to_vec())
            .collect()
    }

    pub(crate) fn invocations(&self) -> Vec<CommandInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Executor for ScriptedExecutor {
    async fn execute(&self, invocation: &CommandInvocation) -> Result<ExecutionResult, ExecError> {
        self.calls.lock().unwrap().push(invocation.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ExecError::CommandFailed {
                    command: invocation.command_line(),
                    output: "unexpected call".to_string(),
                    exit_code: 99,
                })
            })
    }
}

/// Build an args vector from string literals
pub(crate) fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
