//! `armorsync compare`: byte-for-byte equality of two files.
//!
//! Exit status follows `cmp(1)`: 0 equal, 1 different, 2 error.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use armorsync_sync::are_paths_equal;

/// Arguments for `armorsync compare`.
#[derive(Args, Debug)]
pub struct CompareArgs {
    pub first: PathBuf,
    pub second: PathBuf,
}

impl CompareArgs {
    pub fn run(self) -> Result<ExitCode> {
        match are_paths_equal(&self.first, &self.second) {
            Ok(true) => {
                println!("equal");
                Ok(ExitCode::SUCCESS)
            }
            Ok(false) => {
                println!("different");
                Ok(ExitCode::from(1))
            }
            Err(err) => {
                eprintln!("error: {err}");
                Ok(ExitCode::from(2))
            }
        }
    }
}
