//! Repository Locator: does `owner/name` exist for this credential?

use reposync_core::{RepoRef, SyncStatus};
use reposync_host::{GitHost, RepoInfo};

use crate::context::SyncContext;
use crate::error::{Step, SyncError};

/// Outcome of a lookup that reached the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    Found(RepoInfo),
    NotFound,
}

impl Located {
    pub fn is_found(&self) -> bool {
        matches!(self, Located::Found(_))
    }
}

/// Look the repository up once. No retries.
///
/// `Found` → status `RepoExists`; `NotFound` → status `Authenticated`; any
/// other failure → status `Error` with the host's reason.
pub fn locate(host: &dyn GitHost, ctx: &SyncContext, repo: &RepoRef) -> Result<Located, SyncError> {
    let credential = ctx.credential()?;
    ctx.set_status(SyncStatus::CheckingRepo);
    match host.get_repository(&credential, repo) {
        Ok(info) => {
            tracing::info!(%repo, "repository found");
            ctx.set_status(SyncStatus::RepoExists);
            Ok(Located::Found(info))
        }
        Err(err) if err.is_not_found() => {
            tracing::info!(%repo, "repository not found");
            ctx.set_status(SyncStatus::Authenticated);
            Ok(Located::NotFound)
        }
        Err(err) => Err(ctx.host_failure(Step::Locate, err)),
    }
}
