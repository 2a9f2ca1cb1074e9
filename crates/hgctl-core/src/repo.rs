use std::path::{Path, PathBuf};
use tracing::info;

use hgctl_exec::{CommandExecutor, DaemonHandle, Executor};

use crate::branch::BranchController;
use crate::config::{RepositoryConfig, RepositoryConfigBuilder};
use crate::diff::DiffEngine;
use crate::revision::{PreviousRevision, RevisionId, RevisionResolver};
use crate::runner::HgRunner;
use crate::HgError;

/// Options for `hg update`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Clean update to this branch (`-C <branch>`)
    pub branch: Option<String>,
    /// Refuse to update over local changes (`--check`); ignored with `branch`
    pub check: bool,
}

impl UpdateOptions {
    pub fn branch(branch: impl Into<String>) -> Self {
        Self {
            branch: Some(branch.into()),
            check: false,
        }
    }

    pub fn checked() -> Self {
        Self {
            branch: None,
            check: true,
        }
    }

    fn args(&self) -> Vec<&str> {
        let mut args = vec!["update"];
        if let Some(ref branch) = self.branch {
            args.extend(["-C", branch.as_str()]);
        } else if self.check {
            args.push("--check");
        }
        args
    }
}

/// One Mercurial working copy: a config snapshot plus the executor that runs `hg`.
///
/// Methods taking `working_dir: Option<&Path>` run in [`RepositoryConfig::root`]
/// when given `None`. Operations on the same working copy must not run
/// concurrently; see [`WorkdirLocks`](crate::WorkdirLocks).
pub struct Mercurial<E = CommandExecutor> {
    config: RepositoryConfig,
    executor: E,
}

impl Mercurial<CommandExecutor> {
    pub fn new(config: RepositoryConfig) -> Self {
        Self::with_executor(config, CommandExecutor::new())
    }

    /// Start `hg serve` in the working copy and hand back the process
    pub fn serve(&self, working_dir: Option<&Path>) -> Result<DaemonHandle, HgError> {
        let invocation = self.runner().invocation(&["serve"], working_dir);
        let handle = self.executor.spawn_detached(&invocation)?;
        info!(pid = ?handle.id(), cwd = %invocation.working_dir.display(), "Started hg serve");
        Ok(handle)
    }
}

impl<E: Executor> Mercurial<E> {
    pub fn with_executor(config: RepositoryConfig, executor: E) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Replace the config with an updated snapshot
    pub fn reconfigure<F>(&mut self, f: F) -> Result<&RepositoryConfig, HgError>
    where
        F: FnOnce(RepositoryConfigBuilder) -> RepositoryConfigBuilder,
    {
        self.config = self.config.update(f)?;
        Ok(&self.config)
    }

    pub fn set_config(&mut self, config: RepositoryConfig) {
        self.config = config;
    }

    pub fn root(&self) -> PathBuf {
        self.config.root()
    }

    pub fn default_branch(&self) -> &str {
        self.config.default_branch()
    }

    pub fn runner(&self) -> HgRunner<'_> {
        HgRunner::new(&self.config, &self.executor)
    }

    pub fn revisions(&self) -> RevisionResolver<'_> {
        RevisionResolver::new(self.runner())
    }

    pub fn diffs(&self) -> DiffEngine<'_> {
        DiffEngine::new(self.runner())
    }

    pub fn branches(&self) -> BranchController<'_> {
        BranchController::new(self.runner())
    }

    // Revisions and diffs

    pub fn check_file(&self, file: impl AsRef<Path>, working_dir: Option<&Path>) -> Result<(), HgError> {
        self.revisions().check_file(file.as_ref(), working_dir)
    }

    pub async fn current_revision(
        &self,
        file: impl AsRef<Path>,
        working_dir: Option<&Path>,
    ) -> Result<RevisionId, HgError> {
        self.revisions()
            .current_revision(file.as_ref(), working_dir)
            .await
    }

    pub async fn previous_revision(
        &self,
        file: impl AsRef<Path>,
        relative_to: &str,
        working_dir: Option<&Path>,
    ) -> PreviousRevision {
        self.revisions()
            .previous_revision(file.as_ref(), relative_to, working_dir)
            .await
    }

    pub async fn diff(
        &self,
        from: &str,
        to: &str,
        file: impl AsRef<Path>,
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        self.diffs().diff(from, to, file.as_ref(), working_dir).await
    }

    pub async fn last_diff(
        &self,
        file: impl AsRef<Path>,
        base: Option<&str>,
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        self.diffs().last_diff(file.as_ref(), base, working_dir).await
    }

    // Branches

    pub async fn current_branch(&self, working_dir: Option<&Path>) -> Result<String, HgError> {
        self.branches().current_branch(working_dir).await
    }

    pub async fn switch_branch(&self, branch: &str, working_dir: Option<&Path>) -> Result<(), HgError> {
        self.branches().switch_branch(branch, working_dir).await
    }

    pub async fn create_branch(
        &self,
        branch: &str,
        author: &str,
        message: &str,
        working_dir: Option<&Path>,
    ) -> Result<(), HgError> {
        self.branches()
            .create_branch(branch, author, message, working_dir)
            .await
    }

    /// Bring the working copy to `branch`; `file` is accepted for call-site symmetry only
    pub async fn update(&self, _file: impl AsRef<Path>, branch: &str) -> Result<(), HgError> {
        self.switch_branch(branch, None).await
    }

    // Repository lifecycle

    /// `hg init`, creating the directory first if needed
    pub async fn init(&self, working_dir: Option<&Path>) -> Result<String, HgError> {
        let dir = self.runner().working_dir(working_dir);
        tokio::fs::create_dir_all(&dir).await?;
        self.runner().hg(&["init"], Some(&dir)).await
    }

    /// Clone `source` into the configured repo name under `basedir`
    pub async fn clone_repo(&self, source: &str) -> Result<String, HgError> {
        let destination = self.config.clone_destination();
        let destination = destination.to_string_lossy();
        self.runner()
            .hg(&["clone", source, &destination], Some(self.config.basedir()))
            .await
    }

    pub async fn pull(&self, branch: Option<&str>, working_dir: Option<&Path>) -> Result<String, HgError> {
        let mut args = vec!["pull"];
        if let Some(branch) = branch {
            args.extend(["-b", branch]);
        }
        self.runner().hg(&args, working_dir).await
    }

    pub async fn push(&self, branch: Option<&str>, working_dir: Option<&Path>) -> Result<String, HgError> {
        let mut args = vec!["push"];
        if let Some(branch) = branch {
            args.extend(["-b", branch]);
        }
        self.runner().hg(&args, working_dir).await
    }

    pub async fn update_repo(&self, options: &UpdateOptions, working_dir: Option<&Path>) -> Result<String, HgError> {
        self.runner().hg(&options.args(), working_dir).await
    }

    // Working copy changes

    pub async fn add(&self, file: impl AsRef<Path>, working_dir: Option<&Path>) -> Result<String, HgError> {
        let file = file.as_ref().to_string_lossy();
        self.runner().hg(&["add", &file], working_dir).await
    }

    pub async fn remove(&self, file: impl AsRef<Path>, working_dir: Option<&Path>) -> Result<String, HgError> {
        let file = file.as_ref().to_string_lossy();
        self.runner().hg(&["remove", &file], working_dir).await
    }

    pub async fn add_remove(&self, working_dir: Option<&Path>) -> Result<String, HgError> {
        self.runner().hg(&["addremove"], working_dir).await
    }

    /// Commit everything pending; `date` is passed to `-d` when given
    pub async fn commit(
        &self,
        author: &str,
        message: &str,
        date: Option<&str>,
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        let mut args = vec!["commit", "-u", author];
        if let Some(date) = date {
            args.extend(["-d", date]);
        }
        args.extend(["-m", message]);
        self.runner().hg(&args, working_dir).await
    }

    pub async fn status(&self, working_dir: Option<&Path>) -> Result<String, HgError> {
        self.runner().hg(&["status"], working_dir).await
    }

    /// `hg revert -r <revision_args...> <file>`
    pub async fn revert(
        &self,
        file: impl AsRef<Path>,
        revision_args: &[&str],
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        let file = file.as_ref().to_string_lossy();
        let mut args = vec!["revert", "-r"];
        args.extend_from_slice(revision_args);
        args.push(&file);
        self.runner().hg(&args, working_dir).await
    }

    /// Content of `file` at `revision`
    pub async fn file_content(
        &self,
        file: impl AsRef<Path>,
        revision: &str,
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        let file = file.as_ref().to_string_lossy();
        self.runner()
            .hg(&["cat", &file, "-r", revision], working_dir)
            .await
    }

    /// Apply `patch_file` to `file` with the system `patch` program
    pub async fn apply_patch(
        &self,
        file: impl AsRef<Path>,
        patch_file: impl AsRef<Path>,
        working_dir: Option<&Path>,
    ) -> Result<String, HgError> {
        let file = file.as_ref().to_string_lossy();
        let patch_file = patch_file.as_ref().to_string_lossy();
        self.runner()
            .program(&["patch", &file, &patch_file], working_dir)
            .await
    }
}
