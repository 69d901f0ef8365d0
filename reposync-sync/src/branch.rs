//! Branch State Reader: tip of the target branch, bootstrapping an empty
//! repository with a single placeholder commit.

use reposync_core::{BranchTip, RepoRef};
use reposync_host::{GitHost, NewFile};

use crate::context::SyncContext;
use crate::error::{Step, SyncError};

pub const BOOTSTRAP_PATH: &str = "README.md";
pub const BOOTSTRAP_CONTENT: &str = "# New project\n\nInitialized by reposync.\n";
pub const BOOTSTRAP_MESSAGE: &str = "Initialize repository";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TipRead {
    Existing(BranchTip),
    /// The branch did not exist; a placeholder commit created it.
    Bootstrapped(BranchTip),
}

impl TipRead {
    pub fn tip(&self) -> &BranchTip {
        match self {
            TipRead::Existing(tip) | TipRead::Bootstrapped(tip) => tip,
        }
    }

    pub fn was_bootstrapped(&self) -> bool {
        matches!(self, TipRead::Bootstrapped(_))
    }
}

pub fn read_tip(
    host: &dyn GitHost,
    ctx: &SyncContext,
    repo: &RepoRef,
    branch: &str,
) -> Result<TipRead, SyncError> {
    let credential = ctx.credential()?;
    match host.get_branch(&credential, repo, branch) {
        Ok(tip) => {
            tracing::debug!(%repo, branch, commit = %tip.commit_sha, "branch tip");
            Ok(TipRead::Existing(tip))
        }
        Err(err) if err.is_not_found() => {
            tracing::info!(%repo, branch, "branch missing; bootstrapping");
            let file = NewFile {
                path: BOOTSTRAP_PATH.to_owned(),
                content: BOOTSTRAP_CONTENT.to_owned(),
                message: BOOTSTRAP_MESSAGE.to_owned(),
                branch: branch.to_owned(),
            };
            host.create_file(&credential, repo, &file)
                .map(TipRead::Bootstrapped)
                .map_err(|e| ctx.host_failure(Step::Bootstrap, e))
        }
        Err(err) => Err(ctx.host_failure(Step::ReadBranch, err)),
    }
}
