//! Repository Initializer: create the repository, or adopt it on a name
//! collision the account already owns.

use reposync_core::{RepoRef, SyncConfig, SyncStatus};
use reposync_host::{CreateRepoRequest, GitHost, HostError, RepoInfo};

use crate::context::SyncContext;
use crate::error::{Step, SyncError};
use crate::locator::{locate, Located};

/// Fixed attributes of repositories this tool creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSettings {
    pub description: String,
    pub private: bool,
}

impl RepoSettings {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            description: config.repo_description.clone(),
            private: config.private_repos,
        }
    }
}

impl Default for RepoSettings {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Created {
    Created(RepoInfo),
    /// The name was taken, but by a repository this account can use.
    ReusedExisting(RepoInfo),
}

impl Created {
    pub fn info(&self) -> &RepoInfo {
        match self {
            Created::Created(info) | Created::ReusedExisting(info) => info,
        }
    }
}

pub fn create(
    host: &dyn GitHost,
    ctx: &SyncContext,
    repo: &RepoRef,
    settings: &RepoSettings,
) -> Result<Created, SyncError> {
    let credential = ctx.credential()?;
    ctx.set_status(SyncStatus::CreatingRepo);

    let request = CreateRepoRequest {
        name: repo.name.to_string(),
        description: settings.description.clone(),
        private: settings.private,
        auto_init: false,
    };
    match host.create_repository(&credential, &request) {
        Ok(info) => {
            tracing::info!(%repo, "repository created");
            ctx.set_status(SyncStatus::RepoExists);
            Ok(Created::Created(info))
        }
        Err(HostError::AlreadyExists { message }) => {
            tracing::warn!(%repo, %message, "name taken; checking whether it is ours");
            match locate(host, ctx, repo) {
                Ok(Located::Found(info)) => Ok(Created::ReusedExisting(info)),
                Err(err @ SyncError::Auth(_)) => Err(err),
                Ok(Located::NotFound) | Err(_) => {
                    ctx.set_status(SyncStatus::Error);
                    Err(SyncError::NameConflict {
                        repo: repo.name.to_string(),
                    })
                }
            }
        }
        Err(err) => Err(ctx.host_failure(Step::CreateRepository, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposync_core::{Project, ProjectId, RepoName};
    use reposync_host::{HostOp, MemoryHost};

    fn setup() -> (MemoryHost, SyncContext, RepoRef) {
        let host = MemoryHost::new("octocat", "tok");
        let ctx = SyncContext::new(
            Project {
                id: ProjectId::from("p1"),
                title: "demo-app".to_owned(),
                wallet_address: "0xabc".to_owned(),
            },
            Some(host.credential()),
        );
        (host, ctx, RepoRef::new("octocat", RepoName::from("demo-app")))
    }

    #[test]
    fn fresh_name_is_created_private() {
        let (host, ctx, repo) = setup();
        let created = create(&host, &ctx, &repo, &RepoSettings::default()).unwrap();
        assert!(matches!(created, Created::Created(_)));
        assert!(created.info().private);
        assert!(host.has_repository("demo-app"));
        assert_eq!(ctx.status(), SyncStatus::RepoExists);
    }

    #[test]
    fn collision_with_own_repository_is_reused() {
        let (host, ctx, repo) = setup();
        host.add_repository("demo-app");
        let created = create(&host, &ctx, &repo, &RepoSettings::default()).unwrap();
        assert!(matches!(created, Created::ReusedExisting(_)));
        assert_eq!(host.calls(HostOp::GetRepository), 1);
        assert_eq!(ctx.status(), SyncStatus::RepoExists);
    }

    #[test]
    fn collision_with_inaccessible_repository_is_name_conflict() {
        let (host, ctx, repo) = setup();
        host.add_foreign_repository("demo-app");
        let err = create(&host, &ctx, &repo, &RepoSettings::default()).unwrap_err();
        assert!(matches!(err, SyncError::NameConflict { .. }), "got: {err:?}");
        assert_eq!(ctx.status(), SyncStatus::Error);
    }

    #[test]
    fn collision_with_failed_lookup_is_name_conflict() {
        let (host, ctx, repo) = setup();
        host.add_repository("demo-app");
        host.fail_next(HostOp::GetRepository, HostError::Transport("reset".to_owned()));
        let err = create(&host, &ctx, &repo, &RepoSettings::default()).unwrap_err();
        assert!(matches!(err, SyncError::NameConflict { .. }), "got: {err:?}");
    }

    #[test]
    fn rejected_token_during_relookup_stays_an_auth_error() {
        let (host, ctx, repo) = setup();
        host.add_repository("demo-app");
        host.fail_next(
            HostOp::GetRepository,
            HostError::Unauthorized {
                message: "Bad credentials".to_owned(),
            },
        );
        let err = create(&host, &ctx, &repo, &RepoSettings::default()).unwrap_err();
        assert!(matches!(err, SyncError::Auth(ref m) if m == "Bad credentials"), "got: {err:?}");
        assert!(!ctx.has_credential());
        assert_eq!(ctx.status(), SyncStatus::Error);
        assert_eq!(host.calls(HostOp::CreateRepository), 1);
    }

    #[test]
    fn other_creation_failures_pass_through() {
        let (host, ctx, repo) = setup();
        host.fail_next(
            HostOp::CreateRepository,
            HostError::Status {
                status: 500,
                message: "boom".to_owned(),
            },
        );
        let err = create(&host, &ctx, &repo, &RepoSettings::default()).unwrap_err();
        assert_eq!(err.reason(), "boom");
        assert!(matches!(err, SyncError::Host { step: Step::CreateRepository, .. }));
        assert_eq!(host.calls(HostOp::GetRepository), 0);
    }
}
