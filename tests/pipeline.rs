mod common;
use crate::common::{dispatcher_with, init_tracing, sample_tree, ROOT};

use std::path::Path;
use std::sync::Arc;

use treesync::config::DEFAULT_IGNORE_PATTERNS;
use treesync::types::Notification;
use treesync::sync::SyncWorker;
use treesync::watch::{DispatchOptions, DispatchOutcome, IgnoreFilter};
use treesync_test_utils::{RecordingRemoteStore, RemoteCall, ScriptedWatchSource};

const ENDPOINT: &str = "http://localhost:4502/";

fn put(rel: &str, body: &[u8]) -> RemoteCall {
    RemoteCall::Put {
        url: format!("{ENDPOINT}{rel}"),
        body: body.to_vec(),
    }
}

fn delete(rel: &str) -> RemoteCall {
    RemoteCall::Delete {
        url: format!("{ENDPOINT}{rel}"),
    }
}

#[tokio::test]
async fn edits_in_the_tree_end_up_on_the_remote() {
    init_tracing();
    let fs = sample_tree();
    let source = ScriptedWatchSource::new()
        .batch(ROOT, vec![Notification::modified("a.txt")])
        .batch(ROOT, vec![Notification::modified(".gitignore")])
        .batch(ROOT, vec![Notification::created("sub")])
        .batch("/w/sub", vec![Notification::created("b.txt")])
        .batch("/w/docs", vec![Notification::deleted("readme.md")]);
    let filter = IgnoreFilter::new(DEFAULT_IGNORE_PATTERNS.iter().copied(), true);
    let (mut dispatcher, rx) =
        dispatcher_with(source, &fs, filter, DispatchOptions::default());

    dispatcher.scan(Path::new(ROOT)).unwrap();
    fs.add_file("/w/.gitignore", b"target".to_vec());
    fs.add_file("/w/sub/b.txt", b"bravo".to_vec());
    fs.remove("/w/docs/readme.md");

    let outcome = dispatcher.run().unwrap();
    assert_eq!(outcome, DispatchOutcome::SourceClosed);
    // Closes the queue so the worker stops after draining it.
    drop(dispatcher);

    let store = RecordingRemoteStore::new();
    let stats = SyncWorker::new(ROOT, ENDPOINT, store.clone(), Arc::new(fs.clone()), rx)
        .run()
        .await;

    assert_eq!(
        store.calls(),
        vec![
            put("a.txt", b"alpha"),
            put("sub/b.txt", b"bravo"),
            delete("docs/readme.md"),
        ]
    );
    assert_eq!(stats.uploaded, 2);
    assert_eq!(stats.removed, 1);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn worker_keeps_going_after_remote_failures() {
    let fs = sample_tree();
    fs.add_file("/w/b.txt", b"bravo".to_vec());
    let source = ScriptedWatchSource::new()
        .batch(ROOT, vec![Notification::modified("a.txt")])
        .batch(ROOT, vec![Notification::modified("b.txt")]);
    let (mut dispatcher, rx) = dispatcher_with(
        source,
        &fs,
        IgnoreFilter::default(),
        DispatchOptions::default(),
    );

    dispatcher.scan(Path::new(ROOT)).unwrap();
    let store = RecordingRemoteStore::new();
    store.fail_url("http://localhost:4502/a.txt");
    let worker = tokio::spawn(
        SyncWorker::new(ROOT, ENDPOINT, store.clone(), Arc::new(fs.clone()), rx).run(),
    );

    // The dispatcher blocks, so it runs off the async runtime.
    tokio::task::spawn_blocking(move || dispatcher.run())
        .await
        .unwrap()
        .unwrap();

    let stats = worker.await.unwrap();
    assert_eq!(
        store.calls(),
        vec![put("a.txt", b"alpha"), put("b.txt", b"bravo")]
    );
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.uploaded, 1);
}
