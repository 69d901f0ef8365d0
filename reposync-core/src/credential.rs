//! Persisted host credential.
//!
//! Stored at `<home>/.reposync/credential.yaml` with mode `0600`. The file is
//! removed when the host reports the token as invalid.

use std::path::Path;

use chrono::Utc;

use crate::error::{io_err, CoreError};
use crate::paths::{credential_path, home, reposync_root};
use crate::types::Credential;

/// Load the saved credential, if any.
pub fn load_at(home: &Path) -> Result<Option<Credential>, CoreError> {
    let path = credential_path(home);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|source| CoreError::Parse { path, source })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Option<Credential>, CoreError> {
    load_at(&home()?)
}

/// Persist `credential` atomically; stamps `saved_at`.
pub fn save_at(home: &Path, credential: &Credential) -> Result<(), CoreError> {
    let dir = reposync_root(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }

    let mut stamped = credential.clone();
    stamped.saved_at = Some(Utc::now());

    let path = credential_path(home);
    let tmp = path.with_extension("yaml.tmp");
    let yaml = serde_yaml::to_string(&stamped)?;
    std::fs::write(&tmp, yaml).map_err(|e| io_err(&tmp, e))?;
    set_file_permissions(&tmp)?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(credential: &Credential) -> Result<(), CoreError> {
    save_at(&home()?, credential)
}

/// Remove the saved credential. Returns `true` if one existed.
pub fn clear_at(home: &Path) -> Result<bool, CoreError> {
    let path = credential_path(home);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(&path, e)),
    }
}

/// `clear_at` convenience wrapper.
pub fn clear() -> Result<bool, CoreError> {
    clear_at(&home()?)
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), CoreError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), CoreError> {
    Ok(())
}
