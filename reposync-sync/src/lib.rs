//! # reposync-sync
//!
//! Publish a project's file set to a git host as a single commit.
//!
//! Build a [`Syncer`] over a [`GitHost`](reposync_host::GitHost), a
//! [`ProjectStore`] and a [`Notifier`], then call [`Syncer::sync`] with the
//! session's [`SyncContext`]. The pipeline steps are public for callers that
//! need them individually: [`locator`], [`initializer`], [`branch`],
//! [`snapshot`], [`publisher`].

pub mod branch;
pub mod context;
pub mod defaults;
pub mod error;
pub mod guard;
pub mod initializer;
pub mod locator;
pub mod notify;
pub mod orchestrator;
pub mod publisher;
pub mod snapshot;
pub mod store;

pub use context::{StatusHandle, SyncContext};
pub use error::{ErrorKind, Step, SyncError};
pub use guard::SyncGuard;
pub use notify::{Level, Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use orchestrator::{RepoSetup, SyncOutcome, SyncReport, SyncRequest, Syncer};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use store::{HttpProjectStore, MemoryProjectStore, ProjectStore};
