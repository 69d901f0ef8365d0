//! `reposync login`: persist a host credential.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use reposync_core::{credential, Credential};

use super::home_dir;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account login the token belongs to.
    #[arg(long)]
    pub user: String,

    /// Personal access token with `repo` scope.
    #[arg(long, env = "REPOSYNC_TOKEN", hide_env_values = true)]
    pub token: String,
}

impl LoginArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let user = self.user.trim();
        anyhow::ensure!(!user.is_empty(), "--user must not be empty");
        anyhow::ensure!(!self.token.trim().is_empty(), "--token must not be empty");

        credential::save_at(&home, &Credential::new(self.token.trim(), user))
            .context("failed to save credential")?;
        println!("{} Signed in as {}", "✓".green(), user.bold());
        Ok(())
    }
}
