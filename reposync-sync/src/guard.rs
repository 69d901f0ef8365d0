//! Per-project single-flight guard.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use reposync_core::ProjectId;

use crate::error::SyncError;

/// Set of project ids with a sync in flight.
#[derive(Debug, Clone, Default)]
pub struct SyncGuard {
    active: Arc<Mutex<HashSet<ProjectId>>>,
}

/// Held for the duration of one sync; releases the project on drop.
#[derive(Debug)]
pub struct InFlight {
    active: Arc<Mutex<HashSet<ProjectId>>>,
    project: ProjectId,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `project`, or fail with [`SyncError::AlreadySyncing`].
    pub fn acquire(&self, project: ProjectId) -> Result<InFlight, SyncError> {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        if !active.insert(project.clone()) {
            return Err(SyncError::AlreadySyncing { project });
        }
        Ok(InFlight {
            active: Arc::clone(&self.active),
            project,
        })
    }

    pub fn is_active(&self, project: &ProjectId) -> bool {
        self.active
            .lock()
            .map(|a| a.contains(project))
            .unwrap_or(false)
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut active = self.active.lock().unwrap_or_else(|p| p.into_inner());
        active.remove(&self.project);
    }
}
