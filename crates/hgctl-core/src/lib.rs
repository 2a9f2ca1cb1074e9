//! # hgctl-core
//!
//! Programmatic control of Mercurial working copies for build systems and CI.
//!
//! Every operation shells out to `hg` through an [`Executor`](hgctl_exec::Executor);
//! this crate decides what to run, in which order, and how to read the output.
//!
//! ## Key Types
//!
//! - [`Mercurial`] - Facade over one working copy: config snapshot + executor
//! - [`RepositoryConfig`] - Immutable settings, updated by building a new snapshot
//! - [`RevisionResolver`] - Current/previous changeset of a file from `hg parents`
//! - [`DiffEngine`] - Two-revision diffs and the "last diff" of a file
//! - [`BranchController`] - Branch query, the pull-then-update switch, branch creation
//! - [`WorkdirLocks`] - Serializes callers sharing a working copy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hgctl_core::{Mercurial, RepositoryConfig};
//!
//! let config = RepositoryConfig::builder()
//!     .basedir("/builds")
//!     .repo_name("app")
//!     .build()?;
//! let hg = Mercurial::new(config);
//!
//! hg.clone_repo("ssh://hg@example.org/app").await?;
//! let rev = hg.current_revision("src/main.c", None).await?;
//! let diff = hg.last_diff("src/main.c", Some(rev.as_str()), None).await?;
//! ```
//!
//! ## Last diff
//!
//! [`DiffEngine::last_diff`] first diffs the file against its previous
//! revision. If that fails it diffs against revision `0`, so a caller always
//! gets some diff as long as the base revision itself is valid.

mod branch;
mod config;
mod diff;
mod error;
mod lock;
mod repo;
mod revision;
mod runner;

#[cfg(test)]
mod testing;

pub use branch::BranchController;
pub use config::{
    ConfigError, RepositoryConfig, RepositoryConfigBuilder, RepositorySettings, DEFAULT_BRANCH,
    DEFAULT_EXECUTABLE, DEFAULT_TIMEOUT_SECS,
};
pub use diff::DiffEngine;
pub use error::HgError;
pub use lock::{WorkdirGuard, WorkdirLocks};
pub use repo::{Mercurial, UpdateOptions};
pub use revision::{PreviousRevision, RevisionId, RevisionResolver, FIRST_REVISION};
pub use runner::HgRunner;
