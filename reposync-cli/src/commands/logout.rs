//! `reposync logout`

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use reposync_core::credential;

use super::home_dir;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

impl LogoutArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        if credential::clear_at(&home).context("failed to remove credential")? {
            println!("{} Signed out", "✓".green());
        } else {
            println!("No saved credential.");
        }
        Ok(())
    }
}
