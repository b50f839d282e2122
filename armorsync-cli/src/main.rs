//! armorsync: mirror profile files into a managed directory.
//!
//! # Usage
//!
//! ```text
//! armorsync [--config <yaml>] [--profiles-dir <dir>] [--target-dir <dir>] [--strategy hardlink|copy] <command>
//! armorsync sync [--dry-run] [--json]
//! armorsync status [--json]
//! armorsync compare <a> <b>
//! armorsync check
//! armorsync daemon
//! ```
//!
//! Without `--config`, settings come from `POLL_TIME`, `PROFILER_BIN`,
//! `PROFILES_DIR`, `ETC_APPARMORD` and `LINK_STRATEGY`.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use armorsync_core::{Config, LinkStrategy};
use commands::{compare::CompareArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "armorsync",
    version,
    about = "Mirror profile files into a managed directory, hard-link first",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mirror every profile once.
    Sync(SyncArgs),

    /// Show how each profile compares to its mirrored copy.
    Status(StatusArgs),

    /// Compare two files byte for byte.
    Compare(CompareArgs),

    /// Run startup checks and print the resolved configuration.
    Check,

    /// Run the polling daemon in the foreground.
    Daemon,
}

/// Settings shared by every subcommand. Flags override the config source.
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// YAML config file (replaces the environment as the config source).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the source profiles.
    #[arg(long, global = true)]
    pub profiles_dir: Option<PathBuf>,

    /// Managed directory the profiles are mirrored into.
    #[arg(long, global = true)]
    pub target_dir: Option<PathBuf>,

    /// How new files are materialized: hardlink or copy.
    #[arg(long, global = true)]
    pub strategy: Option<LinkStrategy>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl GlobalArgs {
    pub fn resolve(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => Config::from_env().context("invalid environment configuration")?,
        };
        if let Some(dir) = &self.profiles_dir {
            config.profiles_dir = dir.clone();
        }
        if let Some(dir) = &self.target_dir {
            config.target_dir = dir.clone();
        }
        if let Some(strategy) = self.strategy {
            config.link_strategy = strategy;
        }
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    armorsync_daemon::init_tracing(cli.global.log_json);

    match cli.command {
        Commands::Sync(args) => args.run(&cli.global),
        Commands::Status(args) => args.run(&cli.global),
        Commands::Compare(args) => args.run(),
        Commands::Check => commands::check::run(&cli.global),
        Commands::Daemon => commands::daemon::run(&cli.global),
    }
}
