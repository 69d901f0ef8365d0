//! End-to-end pipeline behaviour against the in-memory host and store.

use std::collections::BTreeSet;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use reposync_core::{
    normalize_tree_path, CommitPolicy, Credential, Project, ProjectFileSet, ProjectId, SyncConfig,
    SyncStatus,
};
use reposync_host::{HostError, HostOp, MemoryHost};
use reposync_sync::{
    branch, defaults, locator, ErrorKind, Level, MemoryProjectStore, ProjectStore,
    RecordingNotifier, RepoSetup, SnapshotBuilder, SyncContext, SyncError, SyncOutcome,
    SyncRequest, Syncer,
};

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

const REPO: &str = "demo-app";

fn project() -> Project {
    Project {
        id: ProjectId::from("p-demo"),
        title: "demo-app".to_owned(),
        wallet_address: "0xwallet".to_owned(),
    }
}

struct Harness {
    host: Arc<MemoryHost>,
    store: Arc<MemoryProjectStore>,
    notes: Arc<RecordingNotifier>,
    syncer: Syncer,
    ctx: SyncContext,
}

fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn harness_with(config: SyncConfig, snapshot: SnapshotBuilder) -> Harness {
    init_logs();
    let host = Arc::new(MemoryHost::new("octocat", "tok"));
    let store = Arc::new(MemoryProjectStore::new());
    let notes = Arc::new(RecordingNotifier::new());
    let syncer = Syncer::new(host.clone(), store.clone(), notes.clone(), config)
        .with_snapshot_builder(snapshot);
    let ctx = SyncContext::new(project(), Some(host.credential()));
    Harness {
        host,
        store,
        notes,
        syncer,
        ctx,
    }
}

fn harness() -> Harness {
    harness_with(SyncConfig::default(), SnapshotBuilder::default())
}

fn files(pairs: &[(&str, &str)]) -> ProjectFileSet {
    pairs.iter().copied().collect()
}

fn default_paths() -> BTreeSet<String> {
    defaults::builtin()
        .iter()
        .map(|(p, _)| normalize_tree_path(p).to_owned())
        .collect()
}

fn commit_sha(outcome: &SyncOutcome) -> &str {
    match outcome {
        SyncOutcome::Committed { commit_sha } => commit_sha,
        SyncOutcome::Unchanged => panic!("expected a commit"),
    }
}

// ---------------------------------------------------------------------------
// End-to-end flows
// ---------------------------------------------------------------------------

#[test]
fn new_project_on_empty_account_creates_bootstraps_and_commits() {
    let h = harness();
    h.store.put(&project().id, files(&[("/index.html", "<div id=\"root\"></div>")]));

    let report = h.syncer.sync(&h.ctx, SyncRequest::default()).expect("sync");

    assert_eq!(report.setup, RepoSetup::Created);
    assert!(report.bootstrapped);
    let tree = h.host.branch_files(REPO, "main").expect("branch");
    let mut expected = default_paths();
    expected.insert("index.html".to_owned());
    assert_eq!(tree.keys().cloned().collect::<BTreeSet<_>>(), expected);
    assert_eq!(h.host.history_len(REPO, "main"), 2, "bootstrap + sync commit");

    assert_eq!(h.ctx.status(), SyncStatus::RepoExists);
    assert_eq!(
        h.ctx.status_handle().transitions(),
        vec![
            SyncStatus::Authenticated,
            SyncStatus::CheckingRepo,
            SyncStatus::Authenticated,
            SyncStatus::CreatingRepo,
            SyncStatus::RepoExists,
            SyncStatus::Committing,
            SyncStatus::RepoExists,
        ]
    );
    let notes = h.notes.all();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, Level::Success);
    assert!(notes[0].message.contains("octocat/demo-app"));
}

#[test]
fn editing_one_file_uploads_one_new_blob_on_top_of_previous_tip() {
    let h = harness();
    h.host.add_repository(REPO);
    h.host
        .seed_commit(REPO, "main", &[("README.md", "placeholder")], "init")
        .expect("seed");
    h.store.put(
        &project().id,
        files(&[("/index.html", "<h1>Header</h1>"), ("/src/App.jsx", "app")]),
    );
    h.syncer.sync(&h.ctx, SyncRequest::default()).expect("second commit");
    h.syncer.sync(&h.ctx, SyncRequest::default()).expect("third commit");
    assert_eq!(h.host.history_len(REPO, "main"), 3);

    let previous_tip = h.host.head(REPO, "main").expect("tip");
    let previous_tree = h.host.commit(&previous_tip).expect("commit").tree;
    let blobs_before = h.host.blob_count();
    h.store.edit(&project().id, "/index.html", "<h1>Fixed header</h1>");

    let report = h
        .syncer
        .sync(
            &h.ctx,
            SyncRequest {
                force: false,
                message: Some("Fix header".to_owned()),
            },
        )
        .expect("sync");

    assert_eq!(report.setup, RepoSetup::Existing);
    assert!(!report.bootstrapped);
    assert_eq!(h.host.blob_count(), blobs_before + 1);
    let commit = h.host.commit(commit_sha(&report.outcome)).expect("commit");
    assert_eq!(commit.parents, vec![previous_tip]);
    assert_eq!(commit.message, "Fix header");
    assert_ne!(commit.tree, previous_tree);
    assert_eq!(h.host.history_len(REPO, "main"), 4);
    assert_eq!(
        h.host.branch_files(REPO, "main").expect("files")["index.html"],
        "<h1>Fixed header</h1>"
    );
}

#[test]
fn name_collision_with_own_repository_proceeds_without_error() {
    let h = harness();
    h.host.add_repository(REPO);
    // First lookup misses (e.g. stale visibility), creation then collides.
    h.host.fail_next(
        HostOp::GetRepository,
        HostError::NotFound {
            message: "Not Found".to_owned(),
        },
    );
    h.store.put(&project().id, files(&[("/index.html", "x")]));

    let report = h.syncer.sync(&h.ctx, SyncRequest::default()).expect("sync");

    assert_eq!(report.setup, RepoSetup::Reused);
    assert_eq!(h.host.calls(HostOp::CreateRepository), 1);
    assert_eq!(h.host.calls(HostOp::GetRepository), 2);
    assert_eq!(h.host.calls(HostOp::GetBranch), 1);
    let notes = h.notes.all();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, Level::Success);
}

#[test]
fn empty_file_set_fails_before_any_mutation() {
    let h = harness_with(SyncConfig::default(), SnapshotBuilder::without_defaults());
    h.host.add_repository(REPO);
    h.store.put(&project().id, ProjectFileSet::new());

    let err = h.syncer.sync(&h.ctx, SyncRequest::default()).unwrap_err();

    assert!(matches!(err, SyncError::EmptyCommit));
    assert_eq!(err.kind(), ErrorKind::EmptyCommit);
    assert_eq!(h.host.calls(HostOp::GetRepository), 1);
    assert_eq!(h.host.calls(HostOp::GetBranch), 0);
    assert_eq!(h.host.mutation_calls(), 0);
    assert_eq!(h.ctx.status(), SyncStatus::Error);
    let notes = h.notes.all();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, Level::Error);
    assert_eq!(notes[0].reason.as_deref(), Some("no files to commit"));
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn locate_is_stable_without_intervening_mutation() {
    let h = harness();
    let repo = h.ctx.repo_ref().expect("repo");
    let first = locator::locate(h.host.as_ref(), &h.ctx, &repo).expect("first");
    let second = locator::locate(h.host.as_ref(), &h.ctx, &repo).expect("second");
    assert_eq!(first, second);
    assert!(!first.is_found());

    h.host.add_repository(REPO);
    let third = locator::locate(h.host.as_ref(), &h.ctx, &repo).expect("third");
    let fourth = locator::locate(h.host.as_ref(), &h.ctx, &repo).expect("fourth");
    assert!(third.is_found() && fourth.is_found());
}

#[test]
fn remote_files_outside_the_project_are_preserved() {
    let h = harness();
    h.host.add_repository(REPO);
    h.host
        .seed_commit(REPO, "main", &[("docs/notes.md", "remote only"), ("index.html", "old")], "seed")
        .expect("seed");
    h.store.put(&project().id, files(&[("/index.html", "new")]));

    h.syncer.sync(&h.ctx, SyncRequest::default()).expect("sync");

    let tree = h.host.branch_files(REPO, "main").expect("files");
    assert_eq!(tree["docs/notes.md"], "remote only");
    assert_eq!(tree["index.html"], "new");
}

#[test]
fn bootstrapped_tip_is_a_usable_base_tree() {
    let h = harness();
    h.host.add_repository(REPO);
    let repo = h.ctx.repo_ref().expect("repo");

    let read = branch::read_tip(h.host.as_ref(), &h.ctx, &repo, "main").expect("tip");
    assert!(read.was_bootstrapped());

    let snapshot = SnapshotBuilder::without_defaults()
        .build(
            h.host.as_ref(),
            &h.ctx,
            &repo,
            &files(&[("/index.html", "x")]),
            &read.tip().tree_sha,
        )
        .expect("build on bootstrap tree");
    let tree = h.host.tree_files(&snapshot.tree_sha).expect("tree");
    assert!(tree.contains_key(branch::BOOTSTRAP_PATH));
    assert!(tree.contains_key("index.html"));
}

#[test]
fn missing_or_blank_message_uses_configured_default() {
    let config = SyncConfig {
        default_commit_message: "Configured default".to_owned(),
        ..SyncConfig::default()
    };
    let h = harness_with(config, SnapshotBuilder::default());
    assert_eq!(h.syncer.config().default_commit_message, "Configured default");
    h.host.add_repository(REPO);
    h.store.put(&project().id, files(&[("/index.html", "x")]));

    for message in [None, Some(String::new()), Some("   ".to_owned())] {
        let report = h
            .syncer
            .sync(&h.ctx, SyncRequest { force: false, message: message.clone() })
            .expect("sync");
        let commit = h.host.commit(commit_sha(&report.outcome)).expect("commit");
        assert_eq!(commit.message, "Configured default", "message {message:?}");
    }
}

#[test]
fn unchanged_resync_still_commits_by_default() {
    let h = harness();
    h.host.add_repository(REPO);
    h.store.put(&project().id, files(&[("/index.html", "same")]));

    let first = h.syncer.sync(&h.ctx, SyncRequest::default()).expect("first");
    let second = h.syncer.sync(&h.ctx, SyncRequest::default()).expect("second");

    assert_eq!(first.tree_sha, second.tree_sha);
    assert_ne!(commit_sha(&first.outcome), commit_sha(&second.outcome));
    assert_eq!(h.host.calls(HostOp::CreateCommit), 2);
}

#[test]
fn skip_unchanged_policy_leaves_branch_alone() {
    let config = SyncConfig {
        commit_policy: CommitPolicy::SkipUnchanged,
        ..SyncConfig::default()
    };
    let h = harness_with(config, SnapshotBuilder::default());
    h.host.add_repository(REPO);
    h.store.put(&project().id, files(&[("/index.html", "same")]));

    h.syncer.sync(&h.ctx, SyncRequest::default()).expect("first");
    let head = h.host.head(REPO, "main");
    let second = h.syncer.sync(&h.ctx, SyncRequest::default()).expect("second");

    assert_eq!(second.outcome, SyncOutcome::Unchanged);
    assert_eq!(h.host.head(REPO, "main"), head);
    assert_eq!(h.host.calls(HostOp::CreateCommit), 1);
    assert_eq!(h.ctx.status(), SyncStatus::RepoExists);
    assert_eq!(h.notes.len(), 2, "unchanged is still a reported success");
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[test]
fn rejected_token_stops_after_first_call_and_clears_credential() {
    let h = harness();
    h.store.put(&project().id, files(&[("/index.html", "x")]));
    let ctx = SyncContext::new(project(), Some(Credential::new("revoked", "octocat")));

    let err = h.syncer.sync(&ctx, SyncRequest::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(!ctx.has_credential());
    assert_eq!(h.host.calls(HostOp::GetRepository), 1);
    assert_eq!(h.host.mutation_calls(), 0);
    assert_eq!(h.store.fetches(), 0);
    assert_eq!(ctx.status(), SyncStatus::Error);
    assert_eq!(h.notes.len(), 1);
}

#[test]
fn inaccessible_name_reports_conflict() {
    let h = harness();
    h.host.add_foreign_repository(REPO);
    h.store.put(&project().id, files(&[("/index.html", "x")]));

    let err = h.syncer.sync(&h.ctx, SyncRequest::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NameConflict);
    let notes = h.notes.all();
    assert_eq!(notes.len(), 1);
    assert!(notes[0]
        .reason
        .as_deref()
        .is_some_and(|r| r.contains("choose a different name")));
}

#[test]
fn transport_failure_mid_pipeline_surfaces_raw_reason() {
    let h = harness();
    h.host.add_repository(REPO);
    h.store.put(&project().id, files(&[("/index.html", "x")]));
    h.host.fail_next(
        HostOp::CreateCommit,
        HostError::Status {
            status: 500,
            message: "Server Error".to_owned(),
        },
    );

    let err = h.syncer.sync(&h.ctx, SyncRequest::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(h.notes.all()[0].reason.as_deref(), Some("Server Error"));
    assert_eq!(h.host.calls(HostOp::UpdateRef), 0);
    assert_eq!(h.ctx.status(), SyncStatus::Error);

    // A user-initiated retry goes through.
    h.syncer.sync(&h.ctx, SyncRequest::default()).expect("retry");
    assert_eq!(h.ctx.status(), SyncStatus::RepoExists);
}

// ---------------------------------------------------------------------------
// Single flight
// ---------------------------------------------------------------------------

/// Store that parks the first fetch until released.
struct ParkingStore {
    inner: MemoryProjectStore,
    entered: Mutex<Option<mpsc::Sender<()>>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl ProjectStore for ParkingStore {
    fn fetch_codebase(&self, project: &Project) -> Result<ProjectFileSet, SyncError> {
        if let Some(tx) = self.entered.lock().unwrap().take() {
            tx.send(()).unwrap();
            self.release
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(10))
                .unwrap();
        }
        self.inner.fetch_codebase(project)
    }
}

#[test]
fn concurrent_sync_for_same_project_is_rejected() {
    let host = Arc::new(MemoryHost::new("octocat", "tok"));
    host.add_repository(REPO);
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(ParkingStore {
        inner: MemoryProjectStore::new(),
        entered: Mutex::new(Some(entered_tx)),
        release: Mutex::new(release_rx),
    });
    store.inner.put(&project().id, files(&[("/index.html", "x")]));
    let notes = Arc::new(RecordingNotifier::new());
    let syncer = Syncer::new(host.clone(), store, notes.clone(), SyncConfig::default());
    let ctx = SyncContext::new(project(), Some(host.credential()));

    thread::scope(|scope| {
        let first = scope.spawn(|| syncer.sync(&ctx, SyncRequest::default()));
        entered_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("first sync reached the store");

        let err = syncer.sync(&ctx, SyncRequest::default()).unwrap_err();
        assert!(matches!(err, SyncError::AlreadySyncing { .. }), "got: {err:?}");
        assert_eq!(err.kind(), ErrorKind::Busy);
        assert!(notes.is_empty(), "rejected call must not notify");
        assert!(syncer.guard().is_active(&project().id));

        release_tx.send(()).expect("release");
        first.join().expect("join").expect("first sync");
    });

    assert!(!syncer.guard().is_active(&project().id));
    assert_eq!(notes.len(), 1);
    assert_eq!(host.calls(HostOp::CreateCommit), 1);
}
