//! `armorsync check`: run startup checks and print the resolved config.

use std::process::ExitCode;

use anyhow::{Context, Result};

use armorsync_core::preflight;

use crate::GlobalArgs;

pub fn run(global: &GlobalArgs) -> Result<ExitCode> {
    let config = global.resolve()?;
    let checked = preflight(&config).context("preflight failed")?;

    if checked.target_created {
        println!("created {}", config.target_dir.display());
    }
    println!("✓ preflight passed");
    println!(
        "{}",
        serde_json::to_string_pretty(&config).context("failed to serialize config")?
    );
    Ok(ExitCode::SUCCESS)
}
