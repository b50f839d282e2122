//! Discovery of readable profile files in the profiles directory.

use std::path::Path;

use crate::error::{io_err, ConfigError};
use crate::types::ProfileName;

/// List the profile files directly inside `dir`, sorted by name.
///
/// Directories and dot-files are skipped. An empty directory yields an empty
/// list; an unreadable directory is an error.
pub fn list_profiles(dir: &Path) -> Result<Vec<ProfileName>, ConfigError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let file_name = entry.file_name().to_string_lossy().into_owned();

        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            tracing::debug!("directory '{}' will be skipped", file_name);
            continue;
        }
        if file_name.starts_with('.') {
            tracing::debug!("'{}' will be skipped", file_name);
            continue;
        }
        names.push(ProfileName::from(file_name));
    }
    names.sort();

    if names.is_empty() {
        tracing::info!("no profiles found in {}", dir.display());
    } else {
        tracing::debug!("found {} profiles in {}", names.len(), dir.display());
    }
    Ok(names)
}
