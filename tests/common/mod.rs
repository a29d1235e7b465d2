#![allow(dead_code)]

use std::sync::Arc;

use treesync::fs::mock::MockFileSystem;
use treesync::sync::{sync_queue, SyncReceiver};
use treesync::types::SyncTask;
use treesync::watch::{DispatchOptions, EventDispatcher, IgnoreFilter};
use treesync_test_utils::ScriptedWatchSource;

pub use treesync_test_utils::init_tracing;

pub const ROOT: &str = "/w";

/// Mock tree used by most dispatcher tests:
///
/// ```text
/// /w/a.txt
/// /w/.git/HEAD
/// /w/docs/readme.md
/// ```
pub fn sample_tree() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file("/w/a.txt", b"alpha".to_vec());
    fs.add_file("/w/.git/HEAD", b"ref: refs/heads/main".to_vec());
    fs.add_file("/w/docs/readme.md", b"# docs".to_vec());
    fs
}

pub fn dispatcher_with(
    source: ScriptedWatchSource,
    fs: &MockFileSystem,
    filter: IgnoreFilter,
    options: DispatchOptions,
) -> (EventDispatcher<ScriptedWatchSource>, SyncReceiver) {
    let (tx, rx) = sync_queue();
    let dispatcher = EventDispatcher::new(source, filter, Arc::new(fs.clone()), tx, options);
    (dispatcher, rx)
}

pub fn dispatcher(
    source: ScriptedWatchSource,
    fs: &MockFileSystem,
) -> (EventDispatcher<ScriptedWatchSource>, SyncReceiver) {
    dispatcher_with(source, fs, IgnoreFilter::default(), DispatchOptions::default())
}

/// Everything currently queued, in order.
pub fn drain(rx: &mut SyncReceiver) -> Vec<SyncTask> {
    let mut tasks = Vec::new();
    while let Some(task) = rx.try_next() {
        tasks.push(task);
    }
    tasks
}
