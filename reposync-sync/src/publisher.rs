//! Commit Publisher: one commit on the parent, then move the branch.

use reposync_core::config::DEFAULT_COMMIT_MESSAGE;
use reposync_core::{RepoRef, SyncStatus};
use reposync_host::{CreateCommitRequest, GitHost};

use crate::context::SyncContext;
use crate::error::{Step, SyncError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub tree_sha: String,
    pub parent_sha: String,
    /// `None` or blank falls back to [`DEFAULT_COMMIT_MESSAGE`].
    pub message: Option<String>,
    pub branch: String,
    /// Allow a non-fast-forward ref update.
    pub force: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub commit_sha: String,
}

pub fn publish(
    host: &dyn GitHost,
    ctx: &SyncContext,
    repo: &RepoRef,
    request: &PublishRequest,
) -> Result<Published, SyncError> {
    let credential = ctx.credential()?;
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_COMMIT_MESSAGE)
        .to_owned();

    let commit = CreateCommitRequest {
        message,
        tree: request.tree_sha.clone(),
        parents: vec![request.parent_sha.clone()],
    };
    let commit_sha = host
        .create_commit(&credential, repo, &commit)
        .map_err(|e| ctx.host_failure(Step::CreateCommit, e))?;

    host.update_ref(&credential, repo, &request.branch, &commit_sha, request.force)
        .map_err(|e| ctx.host_failure(Step::UpdateRef, e))?;

    tracing::info!(%repo, branch = %request.branch, commit = %commit_sha, force = request.force, "published");
    ctx.set_status(SyncStatus::RepoExists);
    Ok(Published { commit_sha })
}
