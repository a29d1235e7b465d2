use std::time::Duration;

use tokio::time::timeout;
use treesync::errors::TreesyncError;
use treesync::sync::sync_queue;
use treesync::types::SyncTask;

#[tokio::test]
async fn tasks_come_out_in_push_order() {
    let (tx, mut rx) = sync_queue();
    for name in ["c", "a", "b"] {
        tx.push(SyncTask::upsert(format!("/w/{name}"))).unwrap();
    }
    tx.push(SyncTask::remove("/w/a")).unwrap();
    assert_eq!(rx.len(), 4);

    assert_eq!(rx.next().await, Some(SyncTask::upsert("/w/c")));
    assert_eq!(rx.next().await, Some(SyncTask::upsert("/w/a")));
    assert_eq!(rx.next().await, Some(SyncTask::upsert("/w/b")));
    assert_eq!(rx.next().await, Some(SyncTask::remove("/w/a")));
    assert!(rx.is_empty());
}

#[tokio::test]
async fn consumer_waits_while_empty() {
    let (tx, mut rx) = sync_queue();

    let waited = timeout(Duration::from_millis(50), rx.next()).await;
    assert!(waited.is_err(), "next() should still be pending");

    let producer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.push(SyncTask::upsert("/w/late.txt")).unwrap();
        tx
    });

    let task = timeout(Duration::from_secs(5), rx.next()).await.unwrap();
    assert_eq!(task, Some(SyncTask::upsert("/w/late.txt")));
    drop(producer.await.unwrap());
}

#[tokio::test]
async fn closes_after_senders_are_dropped_and_queue_drained() {
    let (tx, mut rx) = sync_queue();
    let other = tx.clone();
    tx.push(SyncTask::upsert("/w/a.txt")).unwrap();
    other.push(SyncTask::remove("/w/b.txt")).unwrap();
    drop(tx);
    drop(other);

    assert_eq!(rx.next().await, Some(SyncTask::upsert("/w/a.txt")));
    assert_eq!(rx.next().await, Some(SyncTask::remove("/w/b.txt")));
    assert_eq!(rx.next().await, None);
}

#[test]
fn push_fails_once_receiver_is_gone() {
    let (tx, rx) = sync_queue();
    assert!(!tx.is_closed());
    drop(rx);

    assert!(tx.is_closed());
    assert!(matches!(
        tx.push(SyncTask::upsert("/w/a.txt")),
        Err(TreesyncError::QueueClosed)
    ));
}

#[test]
fn blocking_consumer_on_a_plain_thread() {
    let (tx, mut rx) = sync_queue();
    let consumer = std::thread::spawn(move || {
        let mut got = Vec::new();
        while let Some(task) = rx.blocking_next() {
            got.push(task);
        }
        got
    });

    tx.push(SyncTask::upsert("/w/1")).unwrap();
    tx.push(SyncTask::upsert("/w/2")).unwrap();
    drop(tx);

    assert_eq!(
        consumer.join().unwrap(),
        vec![SyncTask::upsert("/w/1"), SyncTask::upsert("/w/2")]
    );
}
