//! The project backing store: source of the authoritative file set.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use serde::Deserialize;

use reposync_core::{Project, ProjectFileSet, ProjectId};

use crate::error::SyncError;

/// Read-only access to a project's current files.
pub trait ProjectStore: Send + Sync {
    fn fetch_codebase(&self, project: &Project) -> Result<ProjectFileSet, SyncError>;
}

#[derive(Debug, Deserialize)]
struct CodebaseResponse {
    #[serde(default)]
    codebase: ProjectFileSet,
}

/// Application backend over HTTP:
/// `GET {base}/projects/{id}/codebase?wallet={address}` → `{ "codebase": {...} }`.
pub struct HttpProjectStore {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpProjectStore {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub(crate) fn url(&self, project: &ProjectId) -> String {
        format!("{}/projects/{}/codebase", self.base_url, project)
    }
}

impl ProjectStore for HttpProjectStore {
    fn fetch_codebase(&self, project: &Project) -> Result<ProjectFileSet, SyncError> {
        let url = self.url(&project.id);
        tracing::debug!(%url, "fetching project files");
        let response = self
            .agent
            .get(&url)
            .query("wallet", &project.wallet_address)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(status, _) => {
                    SyncError::Store(format!("backend returned {status} for project {}", project.id))
                }
                ureq::Error::Transport(t) => SyncError::Store(format!("backend unreachable: {t}")),
            })?;
        let body: CodebaseResponse = response
            .into_json()
            .map_err(|e| SyncError::Store(format!("malformed codebase response: {e}")))?;
        Ok(body.codebase)
    }
}

/// In-memory store keyed by project id.
#[derive(Debug, Default)]
pub struct MemoryProjectStore {
    files: RwLock<HashMap<ProjectId, ProjectFileSet>>,
    fetches: AtomicUsize,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the project's file set wholesale.
    pub fn put(&self, project: &ProjectId, files: ProjectFileSet) {
        self.files
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(project.clone(), files);
    }

    /// Edit one file in place.
    pub fn edit(&self, project: &ProjectId, path: &str, content: &str) {
        self.files
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .entry(project.clone())
            .or_default()
            .insert(path, content);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl ProjectStore for MemoryProjectStore {
    fn fetch_codebase(&self, project: &Project) -> Result<ProjectFileSet, SyncError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.files
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&project.id)
            .cloned()
            .ok_or_else(|| SyncError::Store(format!("unknown project {}", project.id)))
    }
}
