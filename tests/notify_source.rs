use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use treesync::types::{ChangeKind, Notification, WatchHandle};
use treesync::watch::{NotifyWatchSource, WatchSource};

const WAIT: Duration = Duration::from_secs(5);

fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    (dir, root)
}

/// Collect notifications for `handle` until `done` is satisfied or time runs
/// out.
fn wait_for(
    source: &mut NotifyWatchSource,
    handle: WatchHandle,
    done: impl Fn(&[Notification]) -> bool,
) -> Vec<Notification> {
    let deadline = Instant::now() + WAIT;
    let mut seen = Vec::new();
    while !done(&seen) {
        let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
            break;
        };
        if let Some(batch) = source.next_batch_timeout(remaining) {
            if batch.handle == handle {
                seen.extend(batch.events);
            }
        }
    }
    seen
}

fn has(seen: &[Notification], kind: ChangeKind, name: &str) -> bool {
    seen.iter()
        .any(|n| n.kind == kind && n.name.as_deref() == Some(Path::new(name)))
}

#[test]
fn register_is_idempotent() {
    let (_tmp, root) = canonical_tempdir();
    let mut source = NotifyWatchSource::new().unwrap();

    let first = source.register(&root).unwrap();
    let again = source.register(&root).unwrap();
    assert_eq!(first, again);

    fs::create_dir(root.join("sub")).unwrap();
    let sub = source.register(&root.join("sub")).unwrap();
    assert_ne!(first, sub);
}

#[test]
fn registering_a_missing_directory_fails() {
    let (_tmp, root) = canonical_tempdir();
    let mut source = NotifyWatchSource::new().unwrap();

    assert!(source.register(&root.join("missing")).is_err());
}

#[test]
fn file_changes_are_reported_by_entry_name() {
    let (_tmp, root) = canonical_tempdir();
    let mut source = NotifyWatchSource::new().unwrap();
    let handle = source.register(&root).unwrap();

    fs::write(root.join("a.txt"), b"one").unwrap();
    let seen = wait_for(&mut source, handle, |s| has(s, ChangeKind::Created, "a.txt"));
    assert!(has(&seen, ChangeKind::Created, "a.txt"), "got {seen:?}");

    fs::remove_file(root.join("a.txt")).unwrap();
    let seen = wait_for(&mut source, handle, |s| has(s, ChangeKind::Deleted, "a.txt"));
    assert!(has(&seen, ChangeKind::Deleted, "a.txt"), "got {seen:?}");
}

#[test]
fn nested_changes_are_not_reported_on_the_parent() {
    let (_tmp, root) = canonical_tempdir();
    fs::create_dir(root.join("sub")).unwrap();
    let mut source = NotifyWatchSource::new().unwrap();
    let top = source.register(&root).unwrap();
    let sub = source.register(&root.join("sub")).unwrap();

    fs::write(root.join("sub").join("b.txt"), b"two").unwrap();
    let seen = wait_for(&mut source, sub, |s| has(s, ChangeKind::Created, "b.txt"));
    assert!(has(&seen, ChangeKind::Created, "b.txt"), "got {seen:?}");

    // Nothing for the parent handle mentions the nested file.
    while let Some(batch) = source.next_batch_timeout(Duration::from_millis(200)) {
        if batch.handle == top {
            assert!(!has(&batch.events, ChangeKind::Created, "b.txt"));
        }
    }
}

#[test]
fn reset_fails_once_the_directory_is_removed() {
    let (_tmp, root) = canonical_tempdir();
    fs::create_dir(root.join("sub")).unwrap();
    let mut source = NotifyWatchSource::new().unwrap();
    let top = source.register(&root).unwrap();
    let sub = source.register(&root.join("sub")).unwrap();

    assert!(source.reset(sub));

    fs::remove_dir(root.join("sub")).unwrap();
    assert!(!source.reset(sub));
    // Forgotten handles stay dead.
    assert!(!source.reset(sub));
    assert!(source.reset(top));
    assert!(!source.reset(WatchHandle(999)));
}

#[test]
fn directory_recreated_at_the_same_path_gets_a_fresh_watch() {
    let (_tmp, root) = canonical_tempdir();
    let sub_dir = root.join("sub");
    fs::create_dir(&sub_dir).unwrap();
    let mut source = NotifyWatchSource::new().unwrap();
    let top = source.register(&root).unwrap();
    let old = source.register(&sub_dir).unwrap();

    fs::remove_dir(&sub_dir).unwrap();
    fs::create_dir(&sub_dir).unwrap();
    let seen = wait_for(&mut source, top, |s| {
        has(s, ChangeKind::Deleted, "sub") && has(s, ChangeKind::Created, "sub")
    });
    assert!(has(&seen, ChangeKind::Created, "sub"), "got {seen:?}");
    while source.next_batch_timeout(Duration::from_millis(200)).is_some() {}

    // The path exists again, but the old watch went with the old directory.
    assert!(!source.reset(old));

    let fresh = source.register(&sub_dir).unwrap();
    assert_ne!(fresh, old);

    fs::write(sub_dir.join("x.txt"), b"x").unwrap();
    let seen = wait_for(&mut source, fresh, |s| has(s, ChangeKind::Created, "x.txt"));
    assert!(has(&seen, ChangeKind::Created, "x.txt"), "got {seen:?}");
}
