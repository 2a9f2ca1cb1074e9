use std::path::{Path, PathBuf};

use hgctl_exec::{CommandInvocation, ExecError, Executor};

use crate::config::RepositoryConfig;
use crate::HgError;

/// Builds `hg` invocations from a config snapshot and hands them to an executor.
///
/// `working_dir` arguments default to [`RepositoryConfig::root`] when `None`.
#[derive(Clone, Copy)]
pub struct HgRunner<'a> {
    config: &'a RepositoryConfig,
    executor: &'a dyn Executor,
}

impl<'a> HgRunner<'a> {
    pub fn new(config: &'a RepositoryConfig, executor: &'a dyn Executor) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &'a RepositoryConfig {
        self.config
    }

    pub fn working_dir(&self, working_dir: Option<&Path>) -> PathBuf {
        working_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.root())
    }

    pub fn invocation(&self, args: &[&str], working_dir: Option<&Path>) -> CommandInvocation {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.config.executable().to_string_lossy().into_owned());
        argv.extend(args.iter().map(|arg| arg.to_string()));

        // Keep output stable regardless of user hgrc and locale
        CommandInvocation::new(argv, self.working_dir(working_dir), self.config.timeout_secs())
            .with_env("HGPLAIN", "1")
    }

    /// Run `hg <args>` and return the captured output
    pub async fn exec(&self, args: &[&str], working_dir: Option<&Path>) -> Result<String, ExecError> {
        let invocation = self.invocation(args, working_dir);
        Ok(self.executor.execute(&invocation).await?.into_output())
    }

    pub async fn hg(&self, args: &[&str], working_dir: Option<&Path>) -> Result<String, HgError> {
        Ok(self.exec(args, working_dir).await?)
    }

    /// Run some other program with the same working directory and timeout rules
    pub async fn program(&self, argv: &[&str], working_dir: Option<&Path>) -> Result<String, HgError> {
        let invocation = CommandInvocation::new(
            argv.iter().copied(),
            self.working_dir(working_dir),
            self.config.timeout_secs(),
        );
        Ok(self.executor.execute(&invocation).await?.into_output())
    }
}
