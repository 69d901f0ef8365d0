use std::path::{Path, PathBuf};

use crate::error::CoreError;

pub const CONFIG_FILE: &str = "config.yaml";
pub const CREDENTIAL_FILE: &str = "credential.yaml";

pub fn reposync_root(home: &Path) -> PathBuf {
    home.join(".reposync")
}

pub fn config_path(home: &Path) -> PathBuf {
    reposync_root(home).join(CONFIG_FILE)
}

pub fn credential_path(home: &Path) -> PathBuf {
    reposync_root(home).join(CREDENTIAL_FILE)
}

pub(crate) fn home() -> Result<PathBuf, CoreError> {
    dirs::home_dir().ok_or(CoreError::HomeNotFound)
}
