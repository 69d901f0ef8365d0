//! `reposync locate`: does the repository for a title exist?

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use reposync_core::{config, credential, Project, ProjectId};
use reposync_host::GithubClient;
use reposync_sync::{locator, SyncContext};

use super::home_dir;

#[derive(Args, Debug)]
pub struct LocateArgs {
    /// Project title; the repository name is derived from it.
    pub title: String,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct LocateJson {
    repo: String,
    exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default_branch: Option<String>,
}

impl LocateArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let config = config::load_at(&home).context("failed to load configuration")?;
        let saved = credential::load_at(&home)
            .context("failed to read credential")?
            .context("not signed in; run `reposync login` first")?;

        let project = Project {
            id: ProjectId::from(self.title.as_str()),
            title: self.title.clone(),
            wallet_address: String::new(),
        };
        let ctx = SyncContext::new(project, Some(saved)).with_persisted_credential(&home);
        let repo = ctx.repo_ref()?;
        let host = GithubClient::new(&config);

        let located = locator::locate(&host, &ctx, &repo)
            .with_context(|| format!("could not look up {repo}"))?;

        let report = match &located {
            locator::Located::Found(info) => LocateJson {
                repo: repo.to_string(),
                exists: true,
                private: Some(info.private),
                default_branch: info.default_branch.clone(),
            },
            locator::Located::NotFound => LocateJson {
                repo: repo.to_string(),
                exists: false,
                private: None,
                default_branch: None,
            },
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else if report.exists {
            let visibility = if report.private == Some(true) { "private" } else { "public" };
            println!("{} {} exists ({visibility})", "✓".green(), report.repo.bold());
        } else {
            println!(
                "{} {} not found; `reposync sync` will create it",
                "·".dimmed(),
                report.repo.bold()
            );
        }
        Ok(())
    }
}
