//! Hard-link-first file materialization.
//!
//! ## `ensure_synced`: decision order
//!
//! 1. Resolve `<destination_dir>/<basename(source)>`.
//! 2. Stat the source; it must be a regular file (symlinks are not followed).
//! 3. Stat the destination; if present it must be a regular file.
//! 4. Same device + inode, or a separate file with equal bytes → no-op.
//! 5. Hard link (directly, or via `<dest>.armorsync.tmp` + rename when a
//!    different file is in the way). A failed link is not an error.
//! 6. Full copy into `<dest>.armorsync.tmp`, `fsync`, rename into place.
//!
//! The destination path never holds a partially written file.

use std::ffi::OsString;
use std::fs::{self, File, Metadata, Permissions};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use armorsync_core::LinkStrategy;

use crate::equality::are_paths_equal;
use crate::error::{io_err, unreadable, EntryKind, Role, SyncError};
use crate::filesystem::same_file;

/// Suffix of the sibling file used to replace a destination atomically.
pub const TMP_SUFFIX: &str = ".armorsync.tmp";

// ---------------------------------------------------------------------------
// Sync outcome
// ---------------------------------------------------------------------------

/// How the destination came to hold the source's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing was written: the destination already matched.
    AlreadyPresent { path: PathBuf },
    /// The destination is now a hard link to the source.
    HardLinked { path: PathBuf },
    /// The destination is now an independent copy of the source.
    Copied { path: PathBuf, bytes: u64 },
}

impl SyncOutcome {
    pub fn path(&self) -> &Path {
        match self {
            SyncOutcome::AlreadyPresent { path }
            | SyncOutcome::HardLinked { path }
            | SyncOutcome::Copied { path, .. } => path,
        }
    }

    /// Whether the destination directory was modified.
    pub fn changed(&self) -> bool {
        !matches!(self, SyncOutcome::AlreadyPresent { .. })
    }
}

// ---------------------------------------------------------------------------
// Materializer
// ---------------------------------------------------------------------------

/// Mirrors single files into a directory using a [`LinkStrategy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Materializer {
    strategy: LinkStrategy,
}

impl Materializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategy(strategy: LinkStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> LinkStrategy {
        self.strategy
    }

    /// Make `<destination_dir>/<basename(source)>` a regular file with the
    /// same content as `source`.
    ///
    /// `destination_dir` must already exist.
    pub fn ensure_synced(
        &self,
        source: &Path,
        destination_dir: &Path,
    ) -> Result<SyncOutcome, SyncError> {
        let destination = destination_path(source, destination_dir)?;
        let source_meta = stat_source(source)?;
        let existing = stat_destination(&destination)?;

        if let Some(dest_meta) = &existing {
            if same_file(&source_meta, dest_meta) {
                tracing::debug!("file {} is already present", destination.display());
                return Ok(SyncOutcome::AlreadyPresent { path: destination });
            }
            if source_meta.len() == dest_meta.len() && are_paths_equal(source, &destination)? {
                tracing::debug!("file {} already has identical content", destination.display());
                return Ok(SyncOutcome::AlreadyPresent { path: destination });
            }
        }

        let tmp = tmp_path(&destination);
        if self.strategy == LinkStrategy::HardLink {
            let staging = match existing {
                Some(_) => {
                    clear_tmp(&tmp)?;
                    Some(tmp.as_path())
                }
                None => None,
            };
            match link_into_place(source, &destination, staging) {
                Ok(()) => {
                    tracing::info!("hard link created in {}", destination.display());
                    return Ok(SyncOutcome::HardLinked { path: destination });
                }
                Err(err) => {
                    tracing::debug!(
                        "hard link {} -> {} failed ({}); falling back to copy",
                        source.display(),
                        destination.display(),
                        err
                    );
                }
            }
        }

        clear_tmp(&tmp)?;
        let bytes = copy_into_place(source, &destination, &tmp, source_meta.permissions())?;
        tracing::info!(
            "copied {} to {} ({} bytes)",
            source.display(),
            destination.display(),
            bytes
        );
        Ok(SyncOutcome::Copied {
            path: destination,
            bytes,
        })
    }
}

/// [`Materializer::ensure_synced`] with the default (hard-link-first) strategy.
pub fn ensure_synced(source: &Path, destination_dir: &Path) -> Result<SyncOutcome, SyncError> {
    Materializer::default().ensure_synced(source, destination_dir)
}

// ---------------------------------------------------------------------------
// Shared checks (also used by `inspect`)
// ---------------------------------------------------------------------------

/// `<destination_dir>/<basename(source)>`: pure, no I/O.
pub(crate) fn destination_path(source: &Path, destination_dir: &Path) -> Result<PathBuf, SyncError> {
    let name = source.file_name().ok_or_else(|| {
        unreadable(
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    Ok(destination_dir.join(name))
}

/// Stat the source without following symlinks; it must be a regular file.
pub(crate) fn stat_source(source: &Path) -> Result<Metadata, SyncError> {
    let meta = fs::symlink_metadata(source).map_err(|e| unreadable(source, e))?;
    ensure_regular(source, &meta, Role::Source)?;
    Ok(meta)
}

/// Stat the destination without following symlinks. `None` when absent.
pub(crate) fn stat_destination(destination: &Path) -> Result<Option<Metadata>, SyncError> {
    match fs::symlink_metadata(destination) {
        Ok(meta) => {
            ensure_regular(destination, &meta, Role::Destination)?;
            Ok(Some(meta))
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(destination, err)),
    }
}

fn ensure_regular(path: &Path, meta: &Metadata, role: Role) -> Result<(), SyncError> {
    let file_type = meta.file_type();
    if file_type.is_file() {
        return Ok(());
    }
    Err(SyncError::NotRegularFile {
        path: path.to_path_buf(),
        role,
        kind: EntryKind::of(&file_type),
    })
}

// ---------------------------------------------------------------------------
// Link / copy
// ---------------------------------------------------------------------------

fn tmp_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(destination.as_os_str());
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Hard-link `source` at `destination`. With `staging`, the link is created
/// there first and renamed over the existing destination, so the old file
/// stays in place until the rename.
fn link_into_place(source: &Path, destination: &Path, staging: Option<&Path>) -> io::Result<()> {
    let Some(tmp) = staging else {
        return fs::hard_link(source, destination);
    };

    fs::hard_link(source, tmp)?;
    if let Err(err) = fs::rename(tmp, destination) {
        let _ = fs::remove_file(tmp);
        return Err(err);
    }
    Ok(())
}

/// Copy `source` into `tmp`, persist it, then rename it over `destination`.
/// `tmp` is removed on every failure.
fn copy_into_place(
    source: &Path,
    destination: &Path,
    tmp: &Path,
    permissions: Permissions,
) -> Result<u64, SyncError> {
    let result = write_copy(source, tmp, permissions).and_then(|bytes| {
        fs::rename(tmp, destination).map_err(|e| io_err(destination, e))?;
        Ok(bytes)
    });
    if result.is_err() {
        let _ = fs::remove_file(tmp);
    }
    result
}

fn write_copy(source: &Path, tmp: &Path, permissions: Permissions) -> Result<u64, SyncError> {
    let mut input = File::open(source).map_err(|e| unreadable(source, e))?;
    let mut output = File::create(tmp).map_err(|e| io_err(tmp, e))?;

    let bytes = io::copy(&mut input, &mut output).map_err(|e| io_err(tmp, e))?;
    output
        .set_permissions(permissions)
        .map_err(|e| io_err(tmp, e))?;
    output.sync_all().map_err(|e| io_err(tmp, e))?;
    Ok(bytes)
}

/// Remove a temporary file left behind by an interrupted sync. Anything other
/// than a file at that name blocks the sync of this destination.
fn clear_tmp(tmp: &Path) -> Result<(), SyncError> {
    let meta = match fs::symlink_metadata(tmp) {
        Ok(meta) => meta,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(io_err(tmp, err)),
    };
    if meta.is_dir() {
        return Err(SyncError::NotRegularFile {
            path: tmp.to_path_buf(),
            role: Role::Destination,
            kind: EntryKind::Directory,
        });
    }
    tracing::debug!("removing stale temporary file {}", tmp.display());
    fs::remove_file(tmp).map_err(|e| io_err(tmp, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
