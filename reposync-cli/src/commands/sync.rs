//! `reposync sync`: commit a project's files to its repository.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use reposync_core::{config, credential, CommitPolicy, Project, ProjectId};
use reposync_host::GithubClient;
use reposync_sync::{
    HttpProjectStore, Level, Notification, Notifier, RepoSetup, SyncContext, SyncReport,
    SyncRequest, Syncer,
};

use super::home_dir;

/// Arguments for `reposync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Backend project id.
    pub project_id: String,

    /// Project title; the repository name is derived from it.
    #[arg(long)]
    pub title: String,

    /// Wallet address that owns the project in the backend.
    #[arg(long)]
    pub wallet: String,

    /// Commit message (defaults to `default_commit_message` from config).
    #[arg(long, short)]
    pub message: Option<String>,

    /// Overwrite the branch even if it moved since it was read.
    #[arg(long)]
    pub force: bool,

    /// Target branch (defaults to `branch` from config).
    #[arg(long)]
    pub branch: Option<String>,

    /// Skip the commit when nothing changed.
    #[arg(long)]
    pub skip_unchanged: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let mut config = config::load_at(&home).context("failed to load configuration")?;
        if let Some(branch) = self.branch {
            config.branch = branch;
        }
        if self.skip_unchanged {
            config.commit_policy = CommitPolicy::SkipUnchanged;
        }
        let saved = credential::load_at(&home).context("failed to read credential")?;

        let project = Project {
            id: ProjectId::from(self.project_id.as_str()),
            title: self.title,
            wallet_address: self.wallet,
        };
        let ctx = SyncContext::new(project, saved).with_persisted_credential(&home);

        let host = Arc::new(GithubClient::new(&config));
        let store = Arc::new(HttpProjectStore::new(
            &config.backend_url,
            Duration::from_secs(config.timeout_secs),
        ));
        let syncer = Syncer::new(host, store, Arc::new(ConsoleNotifier), config);

        let report = syncer
            .sync(
                &ctx,
                SyncRequest {
                    force: self.force,
                    message: self.message,
                },
            )
            .with_context(|| format!("sync failed for project {}", self.project_id))?;
        print_report(&report);
        Ok(())
    }
}

/// Prints notifications to the terminal.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, n: &Notification) {
        match n.level {
            Level::Success => println!("{} {}", "✓".green(), n.message),
            Level::Error => {
                eprintln!("{} {}", "✗".red(), n.message.red());
                if let Some(reason) = &n.reason {
                    eprintln!("  {}", reason.dimmed());
                }
            }
        }
    }
}

fn print_report(report: &SyncReport) {
    match report.setup {
        RepoSetup::Created => println!("  created {}", report.repo),
        RepoSetup::Reused => println!("  reused existing {}", report.repo),
        RepoSetup::Existing => {}
    }
    if report.bootstrapped {
        println!("  initialized empty branch");
    }
    println!("  {} files, tree {}", report.files, report.tree_sha);
}
