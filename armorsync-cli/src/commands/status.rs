//! `armorsync status`: how each profile compares to its mirrored copy.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use armorsync_core::{list_profiles, Config};
use armorsync_sync::{inspect, SyncState};

use crate::GlobalArgs;

/// Arguments for `armorsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ProfileStatus {
    profile: String,
    /// `None` when the profile could not be inspected.
    status: Option<SyncState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ProfileStatus {
    fn out_of_sync(&self) -> bool {
        self.status.map(|s| s.needs_sync()).unwrap_or(true)
    }
}

#[derive(Serialize)]
struct StatusReportJson<'a> {
    profiles_dir: String,
    target_dir: String,
    out_of_sync: usize,
    profiles: &'a [ProfileStatus],
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "profile")]
    profile: String,
    #[tabled(rename = "status")]
    status: String,
}

impl StatusArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let config = global.resolve()?;
        let names = list_profiles(&config.profiles_dir).with_context(|| {
            format!("failed to read profiles from {}", config.profiles_dir.display())
        })?;

        let rows: Vec<ProfileStatus> = names
            .into_iter()
            .map(|name| {
                let source = name.join_onto(&config.profiles_dir);
                match inspect(&source, &config.target_dir) {
                    Ok(state) => ProfileStatus {
                        profile: name.0,
                        status: Some(state),
                        error: None,
                    },
                    Err(err) => ProfileStatus {
                        profile: name.0,
                        status: None,
                        error: Some(err.to_string()),
                    },
                }
            })
            .collect();
        let out_of_sync = rows.iter().filter(|r| r.out_of_sync()).count();
        let has_errors = rows.iter().any(|r| r.error.is_some());

        if self.json {
            print_json(&config, out_of_sync, &rows)?;
        } else {
            print_table(&config, out_of_sync, rows);
        }

        Ok(if has_errors {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        })
    }
}

fn print_json(config: &Config, out_of_sync: usize, rows: &[ProfileStatus]) -> Result<()> {
    let payload = StatusReportJson {
        profiles_dir: config.profiles_dir.display().to_string(),
        target_dir: config.target_dir.display().to_string(),
        out_of_sync,
        profiles: rows,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
    );
    Ok(())
}

fn print_table(config: &Config, out_of_sync: usize, rows: Vec<ProfileStatus>) {
    println!(
        "armorsync v{} | {} → {} | {} profiles | {} out of sync",
        env!("CARGO_PKG_VERSION"),
        config.profiles_dir.display(),
        config.target_dir.display(),
        rows.len(),
        out_of_sync,
    );

    if rows.is_empty() {
        println!("No profiles found.");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            status: match (row.status, row.error) {
                (Some(state), _) => format!("{} {}", state_indicator(Some(state)), state),
                (None, err) => format!(
                    "{} {}",
                    state_indicator(None),
                    err.unwrap_or_else(|| "error".to_string())
                ),
            },
            profile: row.profile,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    if out_of_sync > 0 {
        println!("Run 'armorsync sync' to update the target directory.");
    }
}

fn state_indicator(state: Option<SyncState>) -> String {
    match state {
        Some(SyncState::Linked) => "■".green().bold().to_string(),
        Some(SyncState::Identical) => "■".cyan().bold().to_string(),
        Some(SyncState::Differs) => "■".yellow().bold().to_string(),
        Some(SyncState::Missing) => "■".bright_black().bold().to_string(),
        None => "■".red().bold().to_string(),
    }
}
