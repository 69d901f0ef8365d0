//! Sync Orchestrator: publish a project's current files as one commit.
//!
//! ## `Syncer::sync`: sequence
//!
//! 1. Claim the project in the single-flight guard.
//! 2. Ensure the repository exists (locate, then create on `NotFound`).
//! 3. Fetch the project's files and merge defaults; empty fails here, before
//!    any remote mutation.
//! 4. Read the branch tip, bootstrapping an empty repository.
//! 5. Build the snapshot tree over the tip's tree.
//! 6. Apply the commit policy, then publish.
//!
//! Every terminal state emits exactly one notification. Errors are returned
//! to the caller after the status and notification side effects.

use std::sync::Arc;

use reposync_core::{CommitPolicy, RepoRef, SyncConfig, SyncStatus};
use reposync_host::GitHost;

use crate::branch;
use crate::context::SyncContext;
use crate::error::SyncError;
use crate::guard::SyncGuard;
use crate::initializer::{self, Created, RepoSettings};
use crate::locator::{self, Located};
use crate::notify::{Notification, Notifier};
use crate::publisher::{self, PublishRequest};
use crate::snapshot::SnapshotBuilder;
use crate::store::ProjectStore;

/// How the repository was made available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoSetup {
    Existing,
    Created,
    Reused,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Committed { commit_sha: String },
    /// `skip_unchanged` policy and the tree matched the tip.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub repo: RepoRef,
    pub setup: RepoSetup,
    pub bootstrapped: bool,
    pub tree_sha: String,
    pub files: usize,
    pub outcome: SyncOutcome,
}

/// Caller-supplied options for one sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncRequest {
    pub force: bool,
    pub message: Option<String>,
}

pub struct Syncer {
    host: Arc<dyn GitHost>,
    store: Arc<dyn ProjectStore>,
    notifier: Arc<dyn Notifier>,
    snapshot: SnapshotBuilder,
    guard: SyncGuard,
    config: SyncConfig,
}

impl Syncer {
    pub fn new(
        host: Arc<dyn GitHost>,
        store: Arc<dyn ProjectStore>,
        notifier: Arc<dyn Notifier>,
        config: SyncConfig,
    ) -> Self {
        Self {
            host,
            store,
            notifier,
            snapshot: SnapshotBuilder::default(),
            guard: SyncGuard::new(),
            config,
        }
    }

    pub fn with_snapshot_builder(mut self, snapshot: SnapshotBuilder) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn guard(&self) -> &SyncGuard {
        &self.guard
    }

    /// Locate the project's repository, creating it when absent.
    pub fn ensure_repository(&self, ctx: &SyncContext) -> Result<(RepoRef, RepoSetup), SyncError> {
        let repo = ctx.repo_ref()?;
        let host = self.host.as_ref();
        let setup = match locator::locate(host, ctx, &repo)? {
            Located::Found(_) => RepoSetup::Existing,
            Located::NotFound => {
                let settings = RepoSettings::from_config(&self.config);
                match initializer::create(host, ctx, &repo, &settings)? {
                    Created::Created(_) => RepoSetup::Created,
                    Created::ReusedExisting(_) => RepoSetup::Reused,
                }
            }
        };
        Ok((repo, setup))
    }

    /// Commit the project's current files to its repository.
    ///
    /// A second call for a project that is already syncing fails with
    /// [`SyncError::AlreadySyncing`] and leaves status and notifications alone.
    pub fn sync(&self, ctx: &SyncContext, request: SyncRequest) -> Result<SyncReport, SyncError> {
        let project = ctx.project().id.clone();
        let _in_flight = self.guard.acquire(project.clone())?;
        tracing::info!(%project, force = request.force, "sync started");

        match self.run(ctx, &request) {
            Ok(report) => {
                let message = match &report.outcome {
                    SyncOutcome::Committed { commit_sha } => {
                        format!("Synced {} ({})", report.repo, short_sha(commit_sha))
                    }
                    SyncOutcome::Unchanged => format!("{} is already up to date", report.repo),
                };
                self.notifier.notify(&Notification::success(project, message));
                Ok(report)
            }
            Err(err) => {
                ctx.set_status(SyncStatus::Error);
                tracing::error!(%project, error = %err, "sync failed");
                self.notifier.notify(&Notification::failure(
                    project,
                    failure_summary(&err),
                    err.reason(),
                ));
                Err(err)
            }
        }
    }

    fn run(&self, ctx: &SyncContext, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        let host = self.host.as_ref();
        let (repo, setup) = self.ensure_repository(ctx)?;

        let files = self.store.fetch_codebase(ctx.project())?;
        let file_count = self.snapshot.merge(&files)?.len();

        ctx.set_status(SyncStatus::Committing);
        let tip = branch::read_tip(host, ctx, &repo, &self.config.branch)?;
        let base = tip.tip().clone();

        let snapshot = self.snapshot.build(host, ctx, &repo, &files, &base.tree_sha)?;

        if self.config.commit_policy == CommitPolicy::SkipUnchanged
            && snapshot.tree_sha == base.tree_sha
        {
            tracing::info!(%repo, "tree unchanged; skipping commit");
            ctx.set_status(SyncStatus::RepoExists);
            return Ok(SyncReport {
                repo,
                setup,
                bootstrapped: tip.was_bootstrapped(),
                tree_sha: snapshot.tree_sha,
                files: file_count,
                outcome: SyncOutcome::Unchanged,
            });
        }

        let message = request
            .message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .or_else(|| Some(self.config.default_commit_message.clone()));
        let published = publisher::publish(
            host,
            ctx,
            &repo,
            &PublishRequest {
                tree_sha: snapshot.tree_sha.clone(),
                parent_sha: base.commit_sha,
                message,
                branch: self.config.branch.clone(),
                force: request.force,
            },
        )?;

        Ok(SyncReport {
            repo,
            setup,
            bootstrapped: tip.was_bootstrapped(),
            tree_sha: snapshot.tree_sha,
            files: file_count,
            outcome: SyncOutcome::Committed {
                commit_sha: published.commit_sha,
            },
        })
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn failure_summary(err: &SyncError) -> String {
    match err {
        SyncError::Auth(_) => "Sign in again to sync".to_owned(),
        SyncError::NameConflict { .. } => "Repository name unavailable".to_owned(),
        SyncError::EmptyCommit => "Nothing to sync".to_owned(),
        SyncError::Store(_) => "Could not load project files".to_owned(),
        _ => "Sync failed".to_owned(),
    }
}
