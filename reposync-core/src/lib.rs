//! reposync core library: domain types, configuration, credential storage.
//!
//! - [`types`]: newtypes, file sets, git object records, [`SyncStatus`]
//! - [`config`]: `~/.reposync/config.yaml`
//! - [`credential`]: `~/.reposync/credential.yaml`
//! - [`error`]: [`CoreError`]

pub mod config;
pub mod credential;
pub mod error;
pub mod paths;
pub mod types;

pub use config::{CommitPolicy, SyncConfig};
pub use error::CoreError;
pub use types::{
    normalize_tree_path, BranchTip, Credential, Project, ProjectFileSet, ProjectId, RepoName,
    RepoRef, SyncStatus, TreeEntry,
};
