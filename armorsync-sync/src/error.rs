//! Error types for armorsync-sync.

use std::fmt;
use std::fs::FileType;
use std::path::PathBuf;

use thiserror::Error;

use armorsync_core::ConfigError;

/// Which side of an operation a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
    /// One of the two operands of an equality check.
    Compared,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => write!(f, "source"),
            Role::Destination => write!(f, "destination"),
            Role::Compared => write!(f, "compared"),
        }
    }
}

/// The kind of a non-regular directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    Symlink,
    /// Devices, FIFOs, sockets.
    Special,
}

impl EntryKind {
    pub(crate) fn of(file_type: &FileType) -> Self {
        if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_symlink() {
            EntryKind::Symlink
        } else {
            EntryKind::Special
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Directory => write!(f, "directory"),
            EntryKind::Symlink => write!(f, "symlink"),
            EntryKind::Special => write!(f, "special file"),
        }
    }
}

/// All errors that can arise from equality checks and sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The source cannot be stat'd or opened.
    #[error("source {path} is unreadable: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory, symlink, or special file where a regular file is required.
    #[error("non-regular {role} file {path} ({kind})")]
    NotRegularFile {
        path: PathBuf,
        role: Role,
        kind: EntryKind,
    },

    /// A named entry is missing from a filesystem listing.
    #[error("file '{name}' not found")]
    NotFound { name: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Profile discovery or configuration failed before any file was touched.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::SourceUnreadable`].
pub(crate) fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::SourceUnreadable {
        path: path.into(),
        source,
    }
}
