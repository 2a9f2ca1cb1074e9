use std::path::PathBuf;
use thiserror::Error;

use hgctl_exec::ExecError;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum HgError {
    #[error("Could not find {file} in {root}. Are you sure you have set the correct basedir?")]
    FileNotFound { file: PathBuf, root: PathBuf },

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("No changeset reported for {file}\n{output}")]
    RevisionNotFound { file: PathBuf, output: String },

    /// The branch marker was set but committing it failed; the working copy
    /// is left labelled with `branch` and nothing committed.
    #[error("Branch '{branch}' was set on the working copy but could not be committed: {source}")]
    BranchNotCommitted {
        branch: String,
        #[source]
        source: ExecError,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HgError {
    /// Diagnostic text from the tool invocation behind this error, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            HgError::Exec(e) | HgError::BranchNotCommitted { source: e, .. } => {
                e.captured_output()
            }
            HgError::RevisionNotFound { output, .. } => Some(output),
            _ => None,
        }
    }
}
