//! Byte-for-byte file equality with a size short-circuit.
//!
//! The same algorithm runs against every [`FileSystem`]:
//!
//! 1. Look up both names → `NotFound` if either is absent.
//! 2. Directories, devices, FIFOs and sockets → `NotRegularFile`.
//! 3. Sizes differ → `false`, nothing is opened.
//! 4. Compare contents chunk by chunk, stopping at the first difference.

use std::io::{self, Read};
use std::path::Path;

use crate::error::{io_err, EntryKind, Role, SyncError};
use crate::filesystem::{DiskFs, EntryInfo, FileSystem};

const CHUNK_SIZE: usize = 64 * 1024;

/// Compare two files on the real filesystem.
///
/// Relative paths resolve against the current working directory.
pub fn are_paths_equal(a: &Path, b: &Path) -> Result<bool, SyncError> {
    are_files_equal(&DiskFs::host(), a, b)
}

/// Compare two entries of `fs` byte for byte.
pub fn are_files_equal<F>(fs: &F, a: &Path, b: &Path) -> Result<bool, SyncError>
where
    F: FileSystem + ?Sized,
{
    let left = lookup_file(fs, a)?;
    let right = lookup_file(fs, b)?;

    if left.size != right.size {
        tracing::debug!(
            "size mismatch: {} ({} bytes) vs {} ({} bytes)",
            a.display(),
            left.size,
            b.display(),
            right.size
        );
        return Ok(false);
    }

    let mut left_reader = fs.open(a).map_err(|e| io_err(a, e))?;
    let mut right_reader = fs.open(b).map_err(|e| io_err(b, e))?;
    streams_equal(a, &mut left_reader, b, &mut right_reader)
}

fn lookup_file<F>(fs: &F, name: &Path) -> Result<EntryInfo, SyncError>
where
    F: FileSystem + ?Sized,
{
    let entry = fs
        .lookup(name)
        .map_err(|e| io_err(name, e))?
        .ok_or_else(|| SyncError::NotFound {
            name: name.to_string_lossy().into_owned(),
        })?;
    if !entry.is_file {
        let kind = if entry.is_dir {
            EntryKind::Directory
        } else {
            EntryKind::Special
        };
        return Err(SyncError::NotRegularFile {
            path: name.to_path_buf(),
            role: Role::Compared,
            kind,
        });
    }
    Ok(entry)
}

/// Compare two streams until one differs or both end. A stream that ends
/// before the other counts as a difference.
fn streams_equal(
    a: &Path,
    left: &mut dyn Read,
    b: &Path,
    right: &mut dyn Read,
) -> Result<bool, SyncError> {
    let mut left_buf = vec![0u8; CHUNK_SIZE];
    let mut right_buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n_left = read_full(left, &mut left_buf).map_err(|e| io_err(a, e))?;
        let n_right = read_full(right, &mut right_buf).map_err(|e| io_err(b, e))?;

        if n_left != n_right || left_buf[..n_left] != right_buf[..n_right] {
            return Ok(false);
        }
        if n_left == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` unless the stream ends first; returns the number of bytes read.
fn read_full(reader: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
