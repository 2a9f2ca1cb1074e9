use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hgctl_core::RepositorySettings;
use hgctl_logging::LogFormat;

#[derive(Parser, Debug)]
#[command(
    name = "hgctl",
    about = "Automation-friendly control of Mercurial repositories",
    version,
    author
)]
pub struct Cli {
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Run in this directory instead of the configured repository root
    #[arg(short = 'd', long, global = true)]
    pub working_dir: Option<PathBuf>,

    /// Log level (RUST_LOG overrides)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, global = true, default_value = "compact")]
    pub log_format: LogFormatChoice,

    /// Also write JSON logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Repository settings; each flag overrides the config files
#[derive(Args, Debug, Default)]
pub struct RepoArgs {
    /// Config file (default: ./hgctl.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory containing the repository
    #[arg(long, global = true)]
    pub basedir: Option<PathBuf>,

    /// Repository directory name under basedir ("." for basedir itself)
    #[arg(long, global = true)]
    pub repo_name: Option<String>,

    #[arg(long, global = true)]
    pub default_branch: Option<String>,

    /// Path to the hg executable
    #[arg(long = "hg", global = true)]
    pub executable: Option<PathBuf>,

    /// Per-command timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl RepoArgs {
    pub fn settings(&self) -> RepositorySettings {
        RepositorySettings {
            basedir: self.basedir.clone(),
            repo_name: self.repo_name.clone(),
            default_branch: self.default_branch.clone(),
            executable: self.executable.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the repository root
    Root,

    /// Changeset that last touched a file
    CurrentRevision { file: PathBuf },

    /// Changeset that touched a file before the given revision ("0" if none)
    PreviousRevision { file: PathBuf, revision: String },

    /// Diff of a file between two revisions
    Diff {
        from: String,
        to: String,
        file: PathBuf,
    },

    /// Diff introduced by the latest change to a file
    LastDiff {
        file: PathBuf,
        /// Revision to treat as the latest (default: current revision)
        #[arg(long)]
        base: Option<String>,
    },

    /// Print the working copy's branch
    CurrentBranch,

    /// Pull and move the working copy to a branch, discarding local changes
    SwitchBranch { branch: String },

    /// Create a branch and commit it
    CreateBranch {
        branch: String,
        #[arg(short = 'u', long)]
        author: String,
        #[arg(short, long)]
        message: String,
    },

    /// Create a new repository in the root
    Init,

    /// Clone a repository into the root
    Clone { source: String },

    Add { file: PathBuf },

    Remove { file: PathBuf },

    /// Add new files and remove missing ones
    Addremove,

    Commit {
        #[arg(short = 'u', long)]
        author: String,
        #[arg(short, long)]
        message: String,
        /// Commit date, in any format hg accepts
        #[arg(long)]
        date: Option<String>,
    },

    Pull {
        #[arg(short, long)]
        branch: Option<String>,
    },

    Push {
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Update the working copy
    Update {
        /// Clean update to this branch
        #[arg(short, long)]
        branch: Option<String>,
        /// Abort on uncommitted changes (ignored with --branch)
        #[arg(long)]
        check: bool,
    },

    Status,

    /// Revert a file; every --rev value is passed after `-r`
    Revert {
        file: PathBuf,
        #[arg(short, long = "rev", required = true)]
        rev: Vec<String>,
    },

    /// Print a file at a revision
    Cat {
        file: PathBuf,
        #[arg(short, long, default_value = "tip")]
        rev: String,
    },

    /// Apply a patch file with the system `patch` program
    ApplyPatch { file: PathBuf, patch: PathBuf },

    /// Run `hg serve` until interrupted
    Serve,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}
