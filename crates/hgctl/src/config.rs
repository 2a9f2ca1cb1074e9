//! Config file support for hgctl.
//!
//! Settings are layered: global config, then `hgctl.toml` in the current
//! directory (or `--config`), then command-line flags.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use hgctl_core::{RepositoryConfig, RepositorySettings};

/// The project config file name
pub const CONFIG_FILE_NAME: &str = "hgctl.toml";

/// Directory under the platform config dir holding the global config
pub const GLOBAL_CONFIG_DIR: &str = "hgctl";

/// Global config file name
pub const GLOBAL_CONFIG_FILE: &str = "config.toml";

pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(GLOBAL_CONFIG_DIR).join(GLOBAL_CONFIG_FILE))
}

/// Build the effective repository config.
///
/// An explicit `config_file` must exist; the default project file and the
/// global file are optional. A file that exists but fails to parse is an error.
pub fn resolve(
    flags: RepositorySettings,
    config_file: Option<&Path>,
    global: Option<&Path>,
    cwd: &Path,
) -> Result<RepositoryConfig> {
    let mut settings = RepositorySettings::default();

    if let Some(global) = global {
        if let Some(file) = RepositorySettings::load(global)? {
            settings = settings.overlay(file);
        }
    }

    let project = match config_file {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            path.to_path_buf()
        }
        None => cwd.join(CONFIG_FILE_NAME),
    };
    if let Some(file) = RepositorySettings::load(&project)? {
        settings = settings.overlay(file);
    }

    settings = settings.overlay(flags);

    RepositoryConfig::builder()
        .merge(&settings)
        .build()
        .context("Invalid repository configuration")
}
