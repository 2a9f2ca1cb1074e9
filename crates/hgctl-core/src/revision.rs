use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::runner::HgRunner;
use crate::HgError;

/// Revision of the first changeset in every repository
pub const FIRST_REVISION: &str = "0";

/// A `<sequence-number>:<short-hash>` changeset identifier as printed by hg.
///
/// Opaque outside this module; only the resolver creates them from tool output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the token has the `^\d+:\w+$` shape
    pub fn is_well_formed(&self) -> bool {
        match self.0.split_once(':') {
            Some((seq, hash)) => {
                !seq.is_empty()
                    && seq.bytes().all(|b| b.is_ascii_digit())
                    && !hash.is_empty()
                    && hash.chars().all(|c| c.is_alphanumeric() || c == '_')
            }
            None => false,
        }
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RevisionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Outcome of looking up the revision before another one.
///
/// `NotFound` is an expected answer (first commit of a file, unknown
/// revision, failed query), not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "revision", rename_all = "snake_case")]
pub enum PreviousRevision {
    Found(RevisionId),
    NotFound,
}

impl PreviousRevision {
    pub fn found(&self) -> Option<&RevisionId> {
        match self {
            PreviousRevision::Found(rev) => Some(rev),
            PreviousRevision::NotFound => None,
        }
    }

    /// Revision to diff from: the previous revision, or the repository's first
    pub fn diff_base(&self) -> &str {
        match self {
            PreviousRevision::Found(rev) => rev.as_str(),
            PreviousRevision::NotFound => FIRST_REVISION,
        }
    }
}

impl fmt::Display for PreviousRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.diff_base())
    }
}

/// First `changeset:` token in `hg parents` output
pub(crate) fn parse_changeset(output: &str) -> Option<RevisionId> {
    output
        .lines()
        .filter(|line| line.starts_with("changeset"))
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(|token| RevisionId::new(token.trim()))
        .next()
}

/// Resolves revision identifiers for files from `hg parents`
#[derive(Clone, Copy)]
pub struct RevisionResolver<'a> {
    runner: HgRunner<'a>,
}

impl<'a> RevisionResolver<'a> {
    pub fn new(runner: HgRunner<'a>) -> Self {
        Self { runner }
    }

    /// Fail with `FileNotFound` unless `file` exists under the working directory
    pub fn check_file(&self, file: &Path, working_dir: Option<&Path>) -> Result<(), HgError> {
        let root = self.runner.working_dir(working_dir);
        if root.join(file).exists() {
            Ok(())
        } else {
            Err(HgError::FileNotFound {
                file: file.to_path_buf(),
                root,
            })
        }
    }

    /// Changeset that last touched `file` as of the working copy's parent
    pub async fn current_revision(
        &self,
        file: &Path,
        working_dir: Option<&Path>,
    ) -> Result<RevisionId, HgError> {
        self.check_file(file, working_dir)?;

        let file_arg = file.to_string_lossy();
        let output = self.runner.hg(&["parents", &file_arg], working_dir).await?;

        parse_changeset(&output).ok_or_else(|| HgError::RevisionNotFound {
            file: file.to_path_buf(),
            output,
        })
    }

    /// Changeset that touched `file` before `relative_to`.
    ///
    /// Never fails: any query or parse failure becomes `NotFound`.
    pub async fn previous_revision(
        &self,
        file: &Path,
        relative_to: &str,
        working_dir: Option<&Path>,
    ) -> PreviousRevision {
        let file_arg = file.to_string_lossy();
        match self
            .runner
            .exec(&["parents", "-r", relative_to, &file_arg], working_dir)
            .await
        {
            Ok(output) => match parse_changeset(&output) {
                Some(rev) => PreviousRevision::Found(rev),
                None => {
                    debug!(file = %file.display(), relative_to, "No changeset in parents output");
                    PreviousRevision::NotFound
                }
            },
            Err(e) => {
                debug!(
                    file = %file.display(),
                    relative_to,
                    error = %e,
                    "No previous revision"
                );
                PreviousRevision::NotFound
            }
        }
    }
}
