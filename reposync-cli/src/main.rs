//! reposync: publish project files to GitHub as single commits.
//!
//! # Usage
//!
//! ```text
//! reposync login --user <name> --token <token>
//! reposync logout
//! reposync locate <title> [--json]
//! reposync sync <project-id> --title <title> --wallet <addr> [--message m]
//!               [--force] [--branch b] [--skip-unchanged]
//! reposync config
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    config::ConfigArgs, locate::LocateArgs, login::LoginArgs, logout::LogoutArgs, sync::SyncArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "reposync",
    version,
    about = "Publish a project's files to a GitHub repository",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save a GitHub token for later syncs.
    Login(LoginArgs),

    /// Forget the saved token.
    Logout(LogoutArgs),

    /// Check whether the repository for a project title exists.
    Locate(LocateArgs),

    /// Commit a project's current files to its repository.
    Sync(SyncArgs),

    /// Print the effective configuration.
    Config(ConfigArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Login(args) => args.run(),
        Commands::Logout(args) => args.run(),
        Commands::Locate(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Config(args) => args.run(),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
