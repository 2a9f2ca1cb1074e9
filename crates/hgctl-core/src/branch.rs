use std::path::Path;
use tracing::info;

use crate::runner::HgRunner;
use crate::HgError;

/// Branch query, switch and creation
#[derive(Clone, Copy)]
pub struct BranchController<'a> {
    runner: HgRunner<'a>,
}

impl<'a> BranchController<'a> {
    pub fn new(runner: HgRunner<'a>) -> Self {
        Self { runner }
    }

    pub async fn current_branch(&self, working_dir: Option<&Path>) -> Result<String, HgError> {
        let output = self.runner.hg(&["branch"], working_dir).await?;
        Ok(output.trim().to_string())
    }

    /// Move the working copy to the head of `target`, pulling first.
    ///
    /// Local modifications are discarded. The first failing step aborts the
    /// rest, possibly leaving the working copy mid-sequence.
    pub async fn switch_branch(&self, target: &str, working_dir: Option<&Path>) -> Result<(), HgError> {
        info!(target, "Switching branch");

        // Clean checkout of the current branch tip
        self.runner.hg(&["update", "-C", "tip"], working_dir).await?;
        // All new changesets, so the target head exists locally
        self.runner.hg(&["pull"], working_dir).await?;
        self.runner.hg(&["update", "--check"], working_dir).await?;
        self.runner.hg(&["update", "-C", target], working_dir).await?;

        Ok(())
    }

    /// Label the working copy with `branch` and commit the label.
    ///
    /// When the commit fails the label stays on the working copy uncommitted;
    /// that case is reported as [`HgError::BranchNotCommitted`].
    pub async fn create_branch(
        &self,
        branch: &str,
        author: &str,
        message: &str,
        working_dir: Option<&Path>,
    ) -> Result<(), HgError> {
        self.runner.hg(&["branch", branch], working_dir).await?;
        self.runner
            .exec(&["commit", "-m", message, "-u", author], working_dir)
            .await
            .map_err(|source| HgError::BranchNotCommitted {
                branch: branch.to_string(),
                source,
            })?;

        info!(branch, author, "Created branch");
        Ok(())
    }
}
