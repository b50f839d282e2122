//! `armorsync daemon`: run the poll loop in the foreground.

use std::process::ExitCode;

use anyhow::{Context, Result};

use armorsync_daemon::start_blocking;

use crate::GlobalArgs;

pub fn run(global: &GlobalArgs) -> Result<ExitCode> {
    let config = global.resolve()?;
    let stats = start_blocking(config).context("daemon exited with error")?;
    println!(
        "daemon stopped after {} passes ({} failed)",
        stats.passes, stats.failed_passes
    );
    Ok(ExitCode::SUCCESS)
}
