//! The narrow host interface the sync pipeline is written against.

use std::fmt;

use reposync_core::{BranchTip, Credential, RepoRef};

use crate::error::HostError;
use crate::wire::{CreateCommitRequest, CreateRepoRequest, CreateTreeRequest, NewFile, RepoInfo};

/// The eight remote operations a sync needs.
///
/// Implementations must be safe to share across threads; the pipeline holds
/// them behind `Arc<dyn GitHost>`.
pub trait GitHost: Send + Sync {
    fn get_repository(&self, cred: &Credential, repo: &RepoRef) -> Result<RepoInfo, HostError>;

    fn create_repository(
        &self,
        cred: &Credential,
        request: &CreateRepoRequest,
    ) -> Result<RepoInfo, HostError>;

    fn get_branch(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        branch: &str,
    ) -> Result<BranchTip, HostError>;

    /// Write one file directly onto `file.branch`, creating the branch when
    /// the repository has no commits. Returns the resulting tip.
    fn create_file(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        file: &NewFile,
    ) -> Result<BranchTip, HostError>;

    /// Returns the blob sha.
    fn create_blob(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        content: &str,
    ) -> Result<String, HostError>;

    /// Returns the tree sha.
    fn create_tree(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        request: &CreateTreeRequest,
    ) -> Result<String, HostError>;

    /// Returns the commit sha.
    fn create_commit(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        request: &CreateCommitRequest,
    ) -> Result<String, HostError>;

    /// Point `refs/heads/<branch>` at `sha`. Returns the sha the ref now holds.
    fn update_ref(
        &self,
        cred: &Credential,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<String, HostError>;
}

/// Names of the host operations, for logging and test instrumentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostOp {
    GetRepository,
    CreateRepository,
    GetBranch,
    CreateFile,
    CreateBlob,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

impl HostOp {
    pub fn all() -> &'static [HostOp] {
        &[
            HostOp::GetRepository,
            HostOp::CreateRepository,
            HostOp::GetBranch,
            HostOp::CreateFile,
            HostOp::CreateBlob,
            HostOp::CreateTree,
            HostOp::CreateCommit,
            HostOp::UpdateRef,
        ]
    }

    /// Whether the operation changes remote state.
    pub fn is_mutation(self) -> bool {
        !matches!(self, HostOp::GetRepository | HostOp::GetBranch)
    }
}

impl fmt::Display for HostOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HostOp::GetRepository => "get_repository",
            HostOp::CreateRepository => "create_repository",
            HostOp::GetBranch => "get_branch",
            HostOp::CreateFile => "create_file",
            HostOp::CreateBlob => "create_blob",
            HostOp::CreateTree => "create_tree",
            HostOp::CreateCommit => "create_commit",
            HostOp::UpdateRef => "update_ref",
        };
        f.write_str(s)
    }
}
