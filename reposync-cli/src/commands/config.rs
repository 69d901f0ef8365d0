//! `reposync config`: print the effective configuration as YAML.

use anyhow::{Context, Result};
use clap::Args;

use reposync_core::config;

use super::home_dir;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

impl ConfigArgs {
    pub fn run(self) -> Result<()> {
        let home = home_dir()?;
        let effective = config::load_at(&home).context("failed to load configuration")?;
        let yaml = serde_yaml::to_string(&effective).context("failed to render configuration")?;
        print!("{yaml}");
        Ok(())
    }
}
