//! End-to-end behaviour of `ensure_synced` on a real filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use armorsync_core::LinkStrategy;
use armorsync_sync::{
    are_paths_equal, ensure_synced, EntryKind, Materializer, Role, SyncError, SyncOutcome,
};
use filetime::{set_file_mtime, FileTime};
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    profiles: PathBuf,
    target: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let root = TempDir::new().expect("tempdir");
        let profiles = root.path().join("profiles");
        let target = root.path().join("custom");
        fs::create_dir_all(&profiles).expect("mkdir profiles");
        fs::create_dir_all(&target).expect("mkdir target");
        Self {
            _root: root,
            profiles,
            target,
        }
    }

    fn profile(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.profiles.join(name);
        fs::write(&path, content).expect("write profile");
        path
    }

    fn target_listing(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(&self.target)
            .expect("read target")
            .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[cfg(unix)]
fn inode(path: &Path) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    let meta = fs::metadata(path).expect("stat");
    (meta.dev(), meta.ino())
}

fn copy_only() -> Materializer {
    Materializer::with_strategy(LinkStrategy::Copy)
}

// ---------------------------------------------------------------------------
// 1. First sync + idempotence
// ---------------------------------------------------------------------------

#[test]
fn abc_profile_is_materialized_then_already_present() {
    let fx = Fixture::new();
    let source = fx.profile("a.profile", b"ABC");

    let first = ensure_synced(&source, &fx.target).expect("first sync");
    assert!(
        matches!(
            first,
            SyncOutcome::HardLinked { .. } | SyncOutcome::Copied { bytes: 3, .. }
        ),
        "got {first:?}"
    );
    let destination = fx.target.join("a.profile");
    assert_eq!(first.path(), destination.as_path());
    assert_eq!(fs::read(&destination).unwrap(), b"ABC");

    let second = ensure_synced(&source, &fx.target).expect("second sync");
    assert_eq!(
        second,
        SyncOutcome::AlreadyPresent {
            path: destination.clone()
        }
    );
    assert_eq!(fs::read(&destination).unwrap(), b"ABC");
    assert_eq!(fx.target_listing(), vec!["a.profile"]);
}

#[cfg(unix)]
#[test]
fn hard_link_first_produces_the_same_underlying_file() {
    let fx = Fixture::new();
    let source = fx.profile("usr.bin.nginx", b"profile nginx {}");

    let outcome = ensure_synced(&source, &fx.target).expect("sync");
    assert!(matches!(outcome, SyncOutcome::HardLinked { .. }), "got {outcome:?}");
    assert_eq!(inode(&source), inode(&fx.target.join("usr.bin.nginx")));
}

#[cfg(unix)]
#[test]
fn in_place_edit_of_linked_source_needs_no_sync() {
    let fx = Fixture::new();
    let source = fx.profile("p", b"v1");
    ensure_synced(&source, &fx.target).expect("sync");

    fs::write(&source, b"version two").expect("edit in place");
    let outcome = ensure_synced(&source, &fx.target).expect("resync");
    assert!(matches!(outcome, SyncOutcome::AlreadyPresent { .. }));
    assert_eq!(fs::read(fx.target.join("p")).unwrap(), b"version two");
}

// ---------------------------------------------------------------------------
// 2. Copy fallback
// ---------------------------------------------------------------------------

#[test]
fn copy_fallback_is_content_equal_but_not_identity_equal() {
    let fx = Fixture::new();
    let source = fx.profile("docker-default", b"profile docker-default {}");

    let outcome = copy_only().ensure_synced(&source, &fx.target).expect("copy");
    let destination = fx.target.join("docker-default");
    assert_eq!(
        outcome,
        SyncOutcome::Copied {
            path: destination.clone(),
            bytes: 25
        }
    );
    assert!(are_paths_equal(&source, &destination).unwrap());
    #[cfg(unix)]
    assert_ne!(inode(&source), inode(&destination));
}

/// A source directory on a different filesystem than the fixture's target,
/// or `None` when the host offers no such mount.
#[cfg(unix)]
fn foreign_source_dir(fx: &Fixture) -> Option<TempDir> {
    let shm = Path::new("/dev/shm");
    if !shm.is_dir() {
        return None;
    }
    let dir = TempDir::new_in(shm).ok()?;
    (inode(dir.path()).0 != inode(&fx.target).0).then_some(dir)
}

#[cfg(unix)]
#[test]
fn failed_hard_link_falls_back_to_a_copy() {
    let fx = Fixture::new();
    let Some(foreign) = foreign_source_dir(&fx) else {
        eprintln!("skipping: no second filesystem available");
        return;
    };
    let source = foreign.path().join("a.profile");
    fs::write(&source, b"ABC").expect("write foreign profile");

    let outcome = ensure_synced(&source, &fx.target).expect("sync across devices");
    let destination = fx.target.join("a.profile");
    assert_eq!(
        outcome,
        SyncOutcome::Copied {
            path: destination.clone(),
            bytes: 3
        }
    );
    assert!(are_paths_equal(&source, &destination).unwrap());
    assert_ne!(inode(&source), inode(&destination));
    assert_eq!(fx.target_listing(), vec!["a.profile"], "no temporary file left");

    let again = ensure_synced(&source, &fx.target).expect("resync");
    assert!(matches!(again, SyncOutcome::AlreadyPresent { .. }), "got {again:?}");
}

#[cfg(unix)]
#[test]
fn failed_hard_link_over_a_stale_file_falls_back_to_a_copy() {
    let fx = Fixture::new();
    let Some(foreign) = foreign_source_dir(&fx) else {
        eprintln!("skipping: no second filesystem available");
        return;
    };
    let source = foreign.path().join("p");
    fs::write(&source, b"fresh").expect("write foreign profile");
    fs::write(fx.target.join("p"), b"stale and longer").expect("stale destination");

    let outcome = ensure_synced(&source, &fx.target).expect("sync across devices");
    assert!(matches!(outcome, SyncOutcome::Copied { bytes: 5, .. }), "got {outcome:?}");
    assert_eq!(fs::read(fx.target.join("p")).unwrap(), b"fresh");
    assert_eq!(fx.target_listing(), vec!["p"], "no temporary file left");
}

#[test]
fn identical_copy_is_not_rewritten() {
    let fx = Fixture::new();
    let source = fx.profile("p", b"same bytes");
    copy_only().ensure_synced(&source, &fx.target).expect("copy");

    let destination = fx.target.join("p");
    let old = FileTime::from_system_time(SystemTime::now() - Duration::from_secs(3600));
    set_file_mtime(&destination, old).expect("age destination");

    let outcome = copy_only().ensure_synced(&source, &fx.target).expect("resync");
    assert!(matches!(outcome, SyncOutcome::AlreadyPresent { .. }));
    let mtime = FileTime::from_last_modification_time(&fs::metadata(&destination).unwrap());
    assert_eq!(mtime, old, "destination must not be rewritten");
}

#[test]
fn changed_source_replaces_stale_copy() {
    let fx = Fixture::new();
    let source = fx.profile("p", b"old");
    copy_only().ensure_synced(&source, &fx.target).expect("copy");

    fs::write(&source, b"new content").expect("update source");
    let outcome = copy_only().ensure_synced(&source, &fx.target).expect("resync");
    assert!(matches!(outcome, SyncOutcome::Copied { bytes: 11, .. }));
    assert_eq!(fs::read(fx.target.join("p")).unwrap(), b"new content");
}

#[test]
fn same_size_different_content_is_replaced() {
    let fx = Fixture::new();
    let source = fx.profile("p", b"0123456789");
    fs::write(fx.target.join("p"), b"012345678X").unwrap();

    let outcome = ensure_synced(&source, &fx.target).expect("sync");
    assert!(outcome.changed());
    assert_eq!(fs::read(fx.target.join("p")).unwrap(), b"0123456789");
}

#[test]
fn replacing_a_destination_never_writes_through_its_old_link() {
    let fx = Fixture::new();
    // The destination starts out as a hard link to an unrelated file.
    let unrelated = fx.profiles.join(".unrelated");
    fs::write(&unrelated, b"keep me").unwrap();
    fs::hard_link(&unrelated, fx.target.join("p")).unwrap();

    let source = fx.profile("p", b"fresh");
    for materializer in [Materializer::new(), copy_only()] {
        materializer.ensure_synced(&source, &fx.target).expect("sync");
        assert_eq!(fs::read(fx.target.join("p")).unwrap(), b"fresh");
        assert_eq!(fs::read(&unrelated).unwrap(), b"keep me");
    }
}

#[cfg(unix)]
#[test]
fn replacing_a_different_file_still_prefers_a_hard_link() {
    let fx = Fixture::new();
    let source = fx.profile("p", b"new");
    fs::write(fx.target.join("p"), b"older and longer").unwrap();

    let outcome = ensure_synced(&source, &fx.target).expect("sync");
    assert!(matches!(outcome, SyncOutcome::HardLinked { .. }), "got {outcome:?}");
    assert_eq!(inode(&source), inode(&fx.target.join("p")));
    assert_eq!(fx.target_listing(), vec!["p"], "no temporary file left");
}

// ---------------------------------------------------------------------------
// 3. Rejection of non-regular entries
// ---------------------------------------------------------------------------

#[test]
fn directory_source_is_rejected_without_mutation() {
    let fx = Fixture::new();
    let source = fx.profiles.join("abstractions");
    fs::create_dir_all(&source).unwrap();

    let err = ensure_synced(&source, &fx.target).unwrap_err();
    assert!(
        matches!(
            err,
            SyncError::NotRegularFile {
                role: Role::Source,
                kind: EntryKind::Directory,
                ..
            }
        ),
        "got: {err}"
    );
    assert!(fx.target_listing().is_empty());
}

#[test]
fn directory_destination_is_rejected_without_mutation() {
    let fx = Fixture::new();
    let source = fx.profile("p", b"x");
    fs::create_dir_all(fx.target.join("p")).unwrap();

    for materializer in [Materializer::new(), copy_only()] {
        let err = materializer.ensure_synced(&source, &fx.target).unwrap_err();
        assert!(
            matches!(
                err,
                SyncError::NotRegularFile {
                    role: Role::Destination,
                    kind: EntryKind::Directory,
                    ..
                }
            ),
            "got: {err}"
        );
    }
    assert!(fx.target.join("p").is_dir());
    assert_eq!(fx.target_listing(), vec!["p"]);
}

#[cfg(unix)]
#[test]
fn symlinks_are_rejected_on_both_sides() {
    use std::os::unix::fs::symlink;

    let fx = Fixture::new();
    let real = fx.profile("real", b"x");
    let link = fx.profiles.join("link");
    symlink(&real, &link).unwrap();

    let err = ensure_synced(&link, &fx.target).unwrap_err();
    assert!(
        matches!(err, SyncError::NotRegularFile { kind: EntryKind::Symlink, role: Role::Source, .. }),
        "got: {err}"
    );

    symlink(&real, fx.target.join("real")).unwrap();
    let err = ensure_synced(&real, &fx.target).unwrap_err();
    assert!(
        matches!(err, SyncError::NotRegularFile { kind: EntryKind::Symlink, role: Role::Destination, .. }),
        "got: {err}"
    );
    assert!(fs::symlink_metadata(fx.target.join("real")).unwrap().file_type().is_symlink());
}

#[test]
fn missing_source_is_unreadable() {
    let fx = Fixture::new();
    let err = ensure_synced(&fx.profiles.join("ghost"), &fx.target).unwrap_err();
    assert!(matches!(err, SyncError::SourceUnreadable { .. }), "got: {err}");
    assert!(err.to_string().contains("ghost"));
    assert!(fx.target_listing().is_empty());
}
