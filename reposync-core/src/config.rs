//! Client configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.reposync/
//!   config.yaml       (optional; every field has a default)
//!   credential.yaml   (mode 0600, see [`crate::credential`])
//! ```
//!
//! A missing file yields [`SyncConfig::default`]; a partial file fills the
//! absent fields with their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};
use crate::paths::{config_path, home, reposync_root};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_API_VERSION: &str = "2022-11-28";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update project files";
pub const DEFAULT_REPO_DESCRIPTION: &str = "Created with reposync";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// What to do when a sync produces the same tree the branch already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Always create a commit, even when nothing changed.
    #[default]
    Always,
    /// Skip commit and ref update when the new tree equals the tip's tree.
    SkipUnchanged,
}

/// Effective configuration for the host client and sync pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub api_base: String,
    pub api_version: String,
    pub backend_url: String,
    pub branch: String,
    pub default_commit_message: String,
    pub repo_description: String,
    pub private_repos: bool,
    pub timeout_secs: u64,
    pub commit_policy: CommitPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            api_version: DEFAULT_API_VERSION.to_owned(),
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            branch: DEFAULT_BRANCH.to_owned(),
            default_commit_message: DEFAULT_COMMIT_MESSAGE.to_owned(),
            repo_description: DEFAULT_REPO_DESCRIPTION.to_owned(),
            private_repos: true,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            commit_policy: CommitPolicy::default(),
        }
    }
}

/// Load `<home>/.reposync/config.yaml`, or defaults when absent.
pub fn load_at(home: &Path) -> Result<SyncConfig, CoreError> {
    let path = config_path(home);
    if !path.exists() {
        return Ok(SyncConfig::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(SyncConfig::default());
    }
    serde_yaml::from_str(&contents).map_err(|source| CoreError::Parse { path, source })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SyncConfig, CoreError> {
    load_at(&home()?)
}

/// Write the configuration atomically (`.tmp` sibling, then rename).
pub fn save_at(home: &Path, config: &SyncConfig) -> Result<(), CoreError> {
    let dir = reposync_root(home);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
    let path = config_path(home);
    let tmp = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}
