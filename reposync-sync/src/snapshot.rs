//! Snapshot Builder: one blob per file, one tree layered over the base.
//!
//! ## Build protocol
//!
//! 1. Merge project files over the template defaults (project wins).
//! 2. Reject an empty merged set before any host call.
//! 3. Upload every blob; uploads run on up to [`BLOB_WORKERS`] threads and
//!    all of them finish before the results are inspected.
//! 4. Any failed upload aborts the build; no tree is created.
//! 5. Create one tree with `base_tree` set, so paths not in the set keep
//!    their remote content.

use std::thread;

use reposync_core::{ProjectFileSet, RepoRef, TreeEntry};
use reposync_host::{CreateTreeRequest, GitHost, HostError};

use crate::context::SyncContext;
use crate::defaults;
use crate::error::{Step, SyncError};

pub const BLOB_WORKERS: usize = 4;

/// The tree a sync will commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub tree_sha: String,
    pub entries: Vec<TreeEntry>,
}

#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    defaults: ProjectFileSet,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new(defaults::builtin())
    }
}

impl SnapshotBuilder {
    pub fn new(defaults: ProjectFileSet) -> Self {
        Self { defaults }
    }

    /// A builder that adds no template files.
    pub fn without_defaults() -> Self {
        Self::new(ProjectFileSet::new())
    }

    pub fn defaults(&self) -> &ProjectFileSet {
        &self.defaults
    }

    /// Project files layered over the defaults; empty is an error.
    pub fn merge(&self, files: &ProjectFileSet) -> Result<ProjectFileSet, SyncError> {
        let merged = files.merged_over(&self.defaults);
        if merged.is_empty() {
            return Err(SyncError::EmptyCommit);
        }
        Ok(merged)
    }

    pub fn build(
        &self,
        host: &dyn GitHost,
        ctx: &SyncContext,
        repo: &RepoRef,
        files: &ProjectFileSet,
        base_tree_sha: &str,
    ) -> Result<Snapshot, SyncError> {
        let merged = self.merge(files)?;
        let credential = ctx.credential()?;

        let items: Vec<(&str, &str)> = merged.iter().collect();
        let chunk = items.len().div_ceil(BLOB_WORKERS).max(1);
        let uploads: Vec<Result<TreeEntry, HostError>> = thread::scope(|scope| {
            let workers: Vec<_> = items
                .chunks(chunk)
                .map(|batch| {
                    let credential = &credential;
                    scope.spawn(move || {
                        batch
                            .iter()
                            .map(|(path, content)| {
                                host.create_blob(credential, repo, content)
                                    .map(|sha| TreeEntry::blob(path, sha))
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| {
                    worker.join().unwrap_or_else(|_| {
                        vec![Err(HostError::Transport("blob upload worker panicked".to_owned()))]
                    })
                })
                .collect()
        });

        let mut entries = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match upload {
                Ok(entry) => entries.push(entry),
                Err(err) => return Err(ctx.host_failure(Step::CreateBlob, err)),
            }
        }
        tracing::debug!(%repo, blobs = entries.len(), "blobs uploaded");

        let request = CreateTreeRequest {
            base_tree: Some(base_tree_sha.to_owned()),
            tree: entries,
        };
        let tree_sha = host
            .create_tree(&credential, repo, &request)
            .map_err(|e| ctx.host_failure(Step::CreateTree, e))?;
        tracing::info!(%repo, tree = %tree_sha, files = request.tree.len(), "tree built");

        Ok(Snapshot {
            tree_sha,
            entries: request.tree,
        })
    }
}
