//! Read-only filesystem capability used by the equality check.
//!
//! [`DiskFs`] reads the real disk; [`MemoryFs`] holds a synthetic file set so
//! the equality algorithm can be exercised without touching disk.

use std::collections::BTreeMap;
use std::fs::{self, File, Metadata};
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// One entry of a root listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    /// A regular file. Devices, FIFOs and sockets are neither this nor
    /// `is_dir`.
    pub is_file: bool,
}

/// Something that can list its root and open entries by name.
pub trait FileSystem {
    /// Entries directly under the root, in name order.
    fn list_root(&self) -> io::Result<Vec<EntryInfo>>;

    /// Open `name` for reading.
    fn open(&self, name: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// Resolve the entry for `name`, or `None` when it does not exist.
    ///
    /// The default scans [`FileSystem::list_root`].
    fn lookup(&self, name: &Path) -> io::Result<Option<EntryInfo>> {
        Ok(self
            .list_root()?
            .into_iter()
            .find(|entry| Path::new(&entry.name) == name))
    }
}

// ---------------------------------------------------------------------------
// DiskFs
// ---------------------------------------------------------------------------

/// The real filesystem, rooted at a directory.
///
/// Relative names resolve against the root; absolute names resolve as-is.
/// Symlinks are followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskFs {
    root: PathBuf,
}

impl DiskFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Rooted at the current working directory.
    pub fn host() -> Self {
        Self::new(".")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &Path) -> PathBuf {
        self.root.join(name)
    }
}

impl FileSystem for DiskFs {
    fn list_root(&self) -> io::Result<Vec<EntryInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let meta = fs::metadata(entry.path())?;
            entries.push(EntryInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                is_dir: meta.is_dir(),
                is_file: meta.is_file(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open(&self, name: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(self.resolve(name))?))
    }

    fn lookup(&self, name: &Path) -> io::Result<Option<EntryInfo>> {
        let path = self.resolve(name);
        match fs::metadata(&path) {
            Ok(meta) => Ok(Some(EntryInfo {
                name: name.to_string_lossy().into_owned(),
                size: meta.len(),
                is_dir: meta.is_dir(),
                is_file: meta.is_file(),
            })),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryFs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum MemEntry {
    File(Vec<u8>),
    Dir,
}

/// An in-memory, flat file set.
///
/// Counts every successful [`FileSystem::open`] so tests can assert that
/// content was never read.
#[derive(Debug, Default)]
pub struct MemoryFs {
    entries: BTreeMap<String, MemEntry>,
    opens: AtomicUsize,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.insert_file(name, content);
        self
    }

    pub fn with_dir(mut self, name: &str) -> Self {
        self.entries.insert(name.to_string(), MemEntry::Dir);
        self
    }

    pub fn insert_file(&mut self, name: &str, content: impl Into<Vec<u8>>) {
        self.entries
            .insert(name.to_string(), MemEntry::File(content.into()));
    }

    /// Number of entries opened so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }
}

impl FileSystem for MemoryFs {
    fn list_root(&self) -> io::Result<Vec<EntryInfo>> {
        Ok(self
            .entries
            .iter()
            .map(|(name, entry)| match entry {
                MemEntry::File(bytes) => EntryInfo {
                    name: name.clone(),
                    size: bytes.len() as u64,
                    is_dir: false,
                    is_file: true,
                },
                MemEntry::Dir => EntryInfo {
                    name: name.clone(),
                    size: 0,
                    is_dir: true,
                    is_file: false,
                },
            })
            .collect())
    }

    fn open(&self, name: &Path) -> io::Result<Box<dyn Read + '_>> {
        let key = name.to_string_lossy();
        match self.entries.get(key.as_ref()) {
            Some(MemEntry::File(bytes)) => {
                self.opens.fetch_add(1, Ordering::Relaxed);
                Ok(Box::new(Cursor::new(bytes.as_slice())))
            }
            Some(MemEntry::Dir) => Err(io::Error::other(format!("{key} is a directory"))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{key} not found"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Whether two metadata snapshots describe the same stored file
/// (same device and inode).
#[cfg(unix)]
pub fn same_file(a: &Metadata, b: &Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    a.dev() == b.dev() && a.ino() == b.ino()
}

#[cfg(not(unix))]
pub fn same_file(_a: &Metadata, _b: &Metadata) -> bool {
    false
}
