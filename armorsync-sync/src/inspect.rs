//! Read-only view of where a source stands relative to its destination.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::equality::are_paths_equal;
use crate::error::SyncError;
use crate::filesystem::same_file;
use crate::materialize::{destination_path, stat_destination, stat_source};

/// State of a destination file relative to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Destination is the same stored file as the source.
    Linked,
    /// Destination is a separate file with identical content.
    Identical,
    /// Destination exists with different content.
    Differs,
    /// Destination does not exist.
    Missing,
}

impl SyncState {
    /// Whether a sync pass would write anything.
    pub fn needs_sync(&self) -> bool {
        matches!(self, SyncState::Differs | SyncState::Missing)
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Linked => write!(f, "linked"),
            SyncState::Identical => write!(f, "identical"),
            SyncState::Differs => write!(f, "differs"),
            SyncState::Missing => write!(f, "missing"),
        }
    }
}

/// Classify `<destination_dir>/<basename(source)>` without modifying anything.
///
/// Applies the same regular-file checks as [`crate::ensure_synced`].
pub fn inspect(source: &Path, destination_dir: &Path) -> Result<SyncState, SyncError> {
    let destination = destination_path(source, destination_dir)?;
    let source_meta = stat_source(source)?;
    let Some(dest_meta) = stat_destination(&destination)? else {
        return Ok(SyncState::Missing);
    };

    if same_file(&source_meta, &dest_meta) {
        return Ok(SyncState::Linked);
    }
    if source_meta.len() == dest_meta.len() && are_paths_equal(source, &destination)? {
        return Ok(SyncState::Identical);
    }
    Ok(SyncState::Differs)
}
