//! Per-session sync state: the project, its credential, and its status.
//!
//! Every pipeline component receives the [`SyncContext`] explicitly. Status is
//! written only by the component currently running and may be read from any
//! thread through a cloned [`StatusHandle`].

use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use reposync_core::{credential, Credential, Project, RepoRef, SyncStatus};
use reposync_host::HostError;

use crate::error::{Step, SyncError};

#[derive(Debug, Default)]
struct StatusCell {
    current: SyncStatus,
    transitions: Vec<SyncStatus>,
}

/// Shared read handle on a session's [`SyncStatus`].
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    cell: Arc<RwLock<StatusCell>>,
}

impl StatusHandle {
    fn starting_at(status: SyncStatus) -> Self {
        Self {
            cell: Arc::new(RwLock::new(StatusCell {
                current: status,
                transitions: vec![status],
            })),
        }
    }

    pub fn get(&self) -> SyncStatus {
        self.cell.read().map(|c| c.current).unwrap_or(SyncStatus::Error)
    }

    /// Every value the status has held, oldest first.
    pub fn transitions(&self) -> Vec<SyncStatus> {
        self.cell
            .read()
            .map(|c| c.transitions.clone())
            .unwrap_or_default()
    }

    fn set(&self, next: SyncStatus) {
        let mut cell = self.cell.write().unwrap_or_else(|p| p.into_inner());
        if cell.current != next {
            tracing::debug!(from = %cell.current, to = %next, "status");
            cell.current = next;
            cell.transitions.push(next);
        }
    }
}

/// State for one active project session.
#[derive(Debug)]
pub struct SyncContext {
    project: Project,
    credential: Mutex<Option<Credential>>,
    status: StatusHandle,
    credential_home: Option<PathBuf>,
}

impl SyncContext {
    /// Status starts `Authenticated` when a credential is supplied, otherwise
    /// `Disconnected`.
    pub fn new(project: Project, credential: Option<Credential>) -> Self {
        let initial = if credential.is_some() {
            SyncStatus::Authenticated
        } else {
            SyncStatus::Disconnected
        };
        Self {
            project,
            credential: Mutex::new(credential),
            status: StatusHandle::starting_at(initial),
            credential_home: None,
        }
    }

    /// Also remove `<home>/.reposync/credential.yaml` when the credential is
    /// invalidated.
    pub fn with_persisted_credential(mut self, home: impl Into<PathBuf>) -> Self {
        self.credential_home = Some(home.into());
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn status(&self) -> SyncStatus {
        self.status.get()
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    pub(crate) fn set_status(&self, status: SyncStatus) {
        self.status.set(status);
    }

    /// Install a fresh credential (after the external sign-in flow).
    pub fn authenticate(&self, credential: Credential) {
        *self.credential.lock().unwrap_or_else(|p| p.into_inner()) = Some(credential);
        self.set_status(SyncStatus::Authenticated);
    }

    pub fn has_credential(&self) -> bool {
        self.credential
            .lock()
            .map(|c| c.is_some())
            .unwrap_or(false)
    }

    pub fn credential(&self) -> Result<Credential, SyncError> {
        self.credential
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| SyncError::Auth("no credential; sign in first".to_owned()))
    }

    /// The remote repository for this project under the credential's login.
    pub fn repo_ref(&self) -> Result<RepoRef, SyncError> {
        let credential = self.credential()?;
        Ok(RepoRef::new(credential.username, self.project.repo_name()?))
    }

    /// Drop the credential in memory and on disk.
    pub fn invalidate_credential(&self) {
        self.credential
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(home) = &self.credential_home {
            if let Err(err) = credential::clear_at(home) {
                tracing::warn!(error = %err, "could not remove saved credential");
            }
        }
    }

    /// Convert a host failure into a [`SyncError`], moving status to `Error`
    /// and clearing the credential on 401.
    pub(crate) fn host_failure(&self, step: Step, err: HostError) -> SyncError {
        self.set_status(SyncStatus::Error);
        if err.is_unauthorized() {
            tracing::warn!(%step, "credential rejected by host; clearing it");
            self.invalidate_credential();
            return SyncError::Auth(err.message().to_owned());
        }
        tracing::error!(%step, error = %err, "host call failed");
        SyncError::Host { step, source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reposync_core::ProjectId;
    use tempfile::TempDir;

    fn project() -> Project {
        Project {
            id: ProjectId::from("p1"),
            title: "demo-app".to_owned(),
            wallet_address: "0xabc".to_owned(),
        }
    }

    #[test]
    fn initial_status_reflects_credential() {
        let signed_out = SyncContext::new(project(), None);
        assert_eq!(signed_out.status(), SyncStatus::Disconnected);

        let signed_in = SyncContext::new(project(), Some(Credential::new("t", "octocat")));
        assert_eq!(signed_in.status(), SyncStatus::Authenticated);
    }

    #[test]
    fn repo_ref_uses_login_and_title() {
        let ctx = SyncContext::new(project(), Some(Credential::new("t", "octocat")));
        assert_eq!(ctx.repo_ref().unwrap().to_string(), "octocat/demo-app");
    }

    #[test]
    fn unauthorized_clears_memory_and_disk() {
        let home = TempDir::new().unwrap();
        let cred = Credential::new("t", "octocat");
        credential::save_at(home.path(), &cred).unwrap();
        let ctx = SyncContext::new(project(), Some(cred)).with_persisted_credential(home.path());

        let err = ctx.host_failure(
            Step::Locate,
            HostError::Unauthorized {
                message: "Bad credentials".to_owned(),
            },
        );
        assert!(matches!(err, SyncError::Auth(_)));
        assert!(!ctx.has_credential());
        assert!(credential::load_at(home.path()).unwrap().is_none());
        assert_eq!(ctx.status(), SyncStatus::Error);
    }

    #[test]
    fn transitions_skip_repeats() {
        let ctx = SyncContext::new(project(), Some(Credential::new("t", "octocat")));
        ctx.set_status(SyncStatus::CheckingRepo);
        ctx.set_status(SyncStatus::CheckingRepo);
        ctx.set_status(SyncStatus::RepoExists);
        assert_eq!(
            ctx.status_handle().transitions(),
            vec![
                SyncStatus::Authenticated,
                SyncStatus::CheckingRepo,
                SyncStatus::RepoExists
            ]
        );
    }
}
