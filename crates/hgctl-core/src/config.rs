//! Repository configuration.
//!
//! A [`RepositoryConfig`] is an immutable snapshot. Changing a setting means
//! building a new snapshot with [`RepositoryConfig::update`] and handing it to
//! whoever owns the old one.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_BASEDIR: &str = ".";
pub const DEFAULT_BRANCH: &str = "default";
pub const DEFAULT_EXECUTABLE: &str = "hg";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Timeout must be a positive number of seconds")]
    InvalidTimeout,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Settings every repository operation reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    basedir: PathBuf,
    repo_name: String,
    default_branch: String,
    executable: PathBuf,
    timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            basedir: PathBuf::from(DEFAULT_BASEDIR),
            repo_name: String::new(),
            default_branch: DEFAULT_BRANCH.to_string(),
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RepositoryConfig {
    pub fn builder() -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::from(Self::default())
    }

    /// Produce a new snapshot with some settings changed
    pub fn update<F>(&self, f: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(RepositoryConfigBuilder) -> RepositoryConfigBuilder,
    {
        f(RepositoryConfigBuilder::from(self.clone())).build()
    }

    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// Directory of the working copy.
    ///
    /// `basedir + "/"` when the repo name is `"."`, otherwise
    /// `basedir + "/" + repo_name`.
    pub fn root(&self) -> PathBuf {
        let repo_name = if self.repo_name == "." {
            ""
        } else {
            self.repo_name.as_str()
        };
        PathBuf::from(format!("{}/{}", self.basedir.display(), repo_name))
    }

    /// Where `clone` puts the new working copy, relative to `basedir`.
    ///
    /// The clone runs inside `basedir`, so an empty or `"."` repo name clones
    /// into `basedir` itself.
    pub fn clone_destination(&self) -> PathBuf {
        if self.repo_name.is_empty() || self.repo_name == "." {
            PathBuf::from(".")
        } else {
            PathBuf::from(&self.repo_name)
        }
    }
}

/// Builder for [`RepositoryConfig`]; `build` enforces a positive timeout
#[derive(Debug, Clone)]
pub struct RepositoryConfigBuilder {
    config: RepositoryConfig,
}

impl From<RepositoryConfig> for RepositoryConfigBuilder {
    fn from(config: RepositoryConfig) -> Self {
        Self { config }
    }
}

impl RepositoryConfigBuilder {
    pub fn basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.config.basedir = basedir.into();
        self
    }

    pub fn repo_name(mut self, repo_name: impl Into<String>) -> Self {
        self.config.repo_name = repo_name.into();
        self
    }

    pub fn default_branch(mut self, branch: impl Into<String>) -> Self {
        self.config.default_branch = branch.into();
        self
    }

    pub fn executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.config.executable = executable.into();
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Apply every field that is set in `settings`
    pub fn merge(mut self, settings: &RepositorySettings) -> Self {
        if let Some(ref basedir) = settings.basedir {
            self = self.basedir(basedir);
        }
        if let Some(ref repo_name) = settings.repo_name {
            self = self.repo_name(repo_name);
        }
        if let Some(ref branch) = settings.default_branch {
            self = self.default_branch(branch);
        }
        if let Some(ref executable) = settings.executable {
            self = self.executable(executable);
        }
        if let Some(timeout) = settings.timeout_secs {
            self = self.timeout_secs(timeout);
        }
        self
    }

    pub fn build(self) -> Result<RepositoryConfig, ConfigError> {
        if self.config.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(self.config)
    }
}

/// Partial settings as they appear in a config file or on the command line
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepositorySettings {
    pub basedir: Option<PathBuf>,
    pub repo_name: Option<String>,
    pub default_branch: Option<String>,
    pub executable: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl RepositorySettings {
    /// Load settings from a TOML file.
    ///
    /// Returns:
    /// - `Ok(Some(settings))` if the file exists and parses
    /// - `Ok(None)` if the file does not exist
    /// - `Err(...)` if the file exists but fails to parse
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(settings))
    }

    /// Field-wise overlay: values set in `other` win
    pub fn overlay(self, other: RepositorySettings) -> Self {
        Self {
            basedir: other.basedir.or(self.basedir),
            repo_name: other.repo_name.or(self.repo_name),
            default_branch: other.default_branch.or(self.default_branch),
            executable: other.executable.or(self.executable),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
        }
    }
}
