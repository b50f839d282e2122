//! `armorsync sync`: mirror every profile once.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use armorsync_core::preflight;
use armorsync_sync::{pipeline, SyncSummary};

use crate::GlobalArgs;

/// Arguments for `armorsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Show what would be written without touching the target directory.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit a machine-readable JSON summary.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let config = global.resolve()?;
        if !self.dry_run {
            preflight(&config).context("preflight failed")?;
        }

        let report = pipeline::sync_profiles(&config, self.dry_run).with_context(|| {
            format!("failed to sync profiles from {}", config.profiles_dir.display())
        })?;
        let summary = report.summary();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("failed to serialize summary")?
            );
        } else {
            print_results(&summary);
        }

        Ok(if summary.failed > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

fn print_results(summary: &SyncSummary) {
    let prefix = if summary.dry_run { "[dry-run] " } else { "" };

    if summary.profiles == 0 {
        println!("{prefix}✓ no profiles found, nothing to do");
        return;
    }

    if summary.dry_run {
        println!(
            "{prefix}✓ {} profiles ({} to sync, {} up to date, {} failed)",
            summary.profiles, summary.pending, summary.unchanged, summary.failed
        );
    } else {
        println!(
            "{prefix}✓ synced {} profiles ({} linked, {} copied, {} unchanged, {} failed)",
            summary.profiles, summary.linked, summary.copied, summary.unchanged, summary.failed
        );
    }

    for entry in &summary.entries {
        let line = match entry.status.as_str() {
            "hard_linked" => format!("  ⇉  {}", entry.name),
            "copied" => format!("  ✎  {}", entry.name),
            "already_present" | "linked" | "identical" => format!("  ·  {}", entry.name),
            "failed" => format!(
                "  ✗  {}: {}",
                entry.name,
                entry.error.as_deref().unwrap_or("unknown error")
            )
            .red()
            .to_string(),
            state => format!("  ~  {} ({state})", entry.name),
        };
        println!("{line}");
    }
}
