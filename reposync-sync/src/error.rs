//! Error types for reposync-sync.

use std::fmt;

use thiserror::Error;

use reposync_core::{CoreError, ProjectId};
use reposync_host::HostError;

/// The pipeline step a host failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Locate,
    CreateRepository,
    ReadBranch,
    Bootstrap,
    CreateBlob,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Locate => "repository lookup",
            Step::CreateRepository => "repository creation",
            Step::ReadBranch => "branch lookup",
            Step::Bootstrap => "branch bootstrap",
            Step::CreateBlob => "blob upload",
            Step::CreateTree => "tree creation",
            Step::CreateCommit => "commit creation",
            Step::UpdateRef => "branch update",
        };
        f.write_str(s)
    }
}

/// Coarse classes callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    NotFound,
    NameConflict,
    Transport,
    EmptyCommit,
    Busy,
    Store,
    Invalid,
}

/// All errors that can arise from a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or rejected credential. The credential has been cleared.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The name is taken by a repository this account cannot use.
    #[error("repository name '{repo}' already exists but is not accessible; choose a different name")]
    NameConflict { repo: String },

    /// The merged file set was empty; nothing was sent to the host.
    #[error("no files to commit")]
    EmptyCommit,

    /// Another sync for the same project is in flight.
    #[error("a sync is already running for project {project}")]
    AlreadySyncing { project: ProjectId },

    /// A host call failed.
    #[error("{step} failed: {source}")]
    Host {
        step: Step,
        #[source]
        source: HostError,
    },

    /// The project backing store could not supply the file set.
    #[error("project store error: {0}")]
    Store(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Auth(_) => ErrorKind::Auth,
            SyncError::NameConflict { .. } => ErrorKind::NameConflict,
            SyncError::EmptyCommit => ErrorKind::EmptyCommit,
            SyncError::AlreadySyncing { .. } => ErrorKind::Busy,
            SyncError::Host { source, .. } => match source {
                HostError::Unauthorized { .. } => ErrorKind::Auth,
                HostError::NotFound { .. } => ErrorKind::NotFound,
                HostError::AlreadyExists { .. } => ErrorKind::NameConflict,
                _ => ErrorKind::Transport,
            },
            SyncError::Store(_) => ErrorKind::Store,
            SyncError::Core(CoreError::InvalidRepoName { .. }) => ErrorKind::Invalid,
            SyncError::Core(_) => ErrorKind::Store,
        }
    }

    /// The underlying reason, verbatim from the host where there is one.
    pub fn reason(&self) -> String {
        match self {
            SyncError::Host { source, .. } => source.message().to_owned(),
            SyncError::Auth(message) | SyncError::Store(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// The host error behind this failure, if any.
    pub fn host_error(&self) -> Option<&HostError> {
        match self {
            SyncError::Host { source, .. } => Some(source),
            _ => None,
        }
    }
}
