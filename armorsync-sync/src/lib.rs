//! # armorsync-sync
//!
//! File equality checks and hard-link-first file materialization.
//!
//! Call [`ensure_synced`] to mirror one file into a directory, or
//! [`pipeline::sync_profiles`] to mirror every profile named by a
//! [`armorsync_core::Config`]. [`are_paths_equal`] and [`are_files_equal`]
//! expose the byte-equality check on its own.

pub mod equality;
pub mod error;
pub mod filesystem;
pub mod inspect;
pub mod materialize;
pub mod pipeline;

pub use equality::{are_files_equal, are_paths_equal};
pub use error::{EntryKind, Role, SyncError};
pub use filesystem::{DiskFs, EntryInfo, FileSystem, MemoryFs};
pub use inspect::{inspect, SyncState};
pub use materialize::{ensure_synced, Materializer, SyncOutcome};
pub use pipeline::{sync_profiles, ProfileAction, ProfileResult, SyncReport, SyncSummary};
