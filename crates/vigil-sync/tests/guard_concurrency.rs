//! Concurrency tests for SyncGuard.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use vigil_core::{FeatureFlag, SyncValue};
use vigil_sync::{
    LinkState, MockRemoteStore, MockRemoteStoreHandle, RemoteSyncChannel, SyncError, SyncGuard,
    SyncOutcome,
};

fn shared_guard(up: bool) -> (Arc<SyncGuard<MockRemoteStore>>, MockRemoteStoreHandle, LinkState) {
    let (store, handle) = MockRemoteStore::new();
    let link = LinkState::new(up);
    let guard = Arc::new(SyncGuard::new(store, Arc::new(link.clone())));
    (guard, handle, link)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writes_never_overlap() {
    let (guard, handle, _link) = shared_guard(true);
    handle.set_latency(Duration::from_millis(5));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16i64 {
        let guard = Arc::clone(&guard);
        tasks.spawn(async move {
            let signal = if i % 2 == 0 {
                FeatureFlag::Motion
            } else {
                FeatureFlag::Vibration
            };
            guard.write(signal, i).await
        });
    }

    while let Some(result) = tasks.join_next().await {
        assert_eq!(result.unwrap(), SyncOutcome::Completed(Ok(204)));
    }

    assert_eq!(handle.writes().len(), 16);
    assert_eq!(handle.max_in_flight(), 1);
    assert_eq!(guard.stats().completed, 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_reads_and_writes_serialize() {
    let (guard, handle, _link) = shared_guard(true);
    handle.set_latency(Duration::from_millis(2));

    let writer = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move {
            for _ in 0..10 {
                let _ = guard.write(FeatureFlag::Magnetic, true).await;
            }
        })
    };
    let reader = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move {
            for _ in 0..10 {
                let _ = guard.read_status(FeatureFlag::Keypad).await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();

    assert_eq!(handle.writes().len(), 10);
    assert_eq!(handle.reads().len(), 10);
    assert_eq!(handle.max_in_flight(), 1);
}

#[tokio::test]
async fn test_lock_released_after_failure() {
    let (guard, handle, _link) = shared_guard(true);
    handle.fail_with(Some(SyncError::transport("connection reset")));

    let outcome = guard.write(FeatureFlag::Rfid, false).await;
    assert!(matches!(outcome, SyncOutcome::Completed(Err(SyncError::Transport(_)))));

    handle.fail_with(None);
    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        guard.write(FeatureFlag::Rfid, true),
    )
    .await
    .expect("lock was not released after a failed write");
    assert_eq!(outcome, SyncOutcome::Completed(Ok(204)));
}

#[tokio::test]
async fn test_lock_released_after_panic() {
    let (guard, handle, _link) = shared_guard(true);

    let panicking = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move {
            guard
                .with_sync(|_channel: &mut MockRemoteStore| {
                    async move {
                        panic!("transport blew up");
                    }
                    .boxed()
                })
                .await
        })
    };
    let joined: Result<SyncOutcome<()>, _> = panicking.await;
    assert!(joined.unwrap_err().is_panic());

    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        guard.write(FeatureFlag::Motion, true),
    )
    .await
    .expect("lock was not released after a panic");
    assert_eq!(outcome, SyncOutcome::Completed(Ok(204)));
    assert_eq!(handle.writes().len(), 1);
}

#[tokio::test]
async fn test_link_down_never_waits_on_lock() {
    let (guard, handle, link) = shared_guard(true);
    handle.set_latency(Duration::from_secs(60));

    // Park a slow operation on the lock.
    let slow = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move { guard.write(FeatureFlag::Motion, true).await })
    };
    tokio::task::yield_now().await;

    link.set_up(false);
    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        guard.write(FeatureFlag::Vibration, true),
    )
    .await
    .expect("skipped call blocked on the lock");
    assert!(outcome.is_skipped());

    slow.abort();
}

#[tokio::test(start_paused = true)]
async fn test_queued_call_skipped_when_link_drops_while_waiting() {
    let (guard, handle, link) = shared_guard(true);
    handle.set_latency(Duration::from_millis(300));

    let first = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move { guard.write(FeatureFlag::Motion, true).await })
    };
    tokio::task::yield_now().await;

    // Passes the first link check and queues behind `first`.
    let queued = {
        let guard = Arc::clone(&guard);
        tokio::spawn(async move { guard.write(FeatureFlag::Vibration, true).await })
    };
    tokio::task::yield_now().await;

    link.set_up(false);

    assert!(queued.await.unwrap().is_skipped());
    assert_eq!(first.await.unwrap(), SyncOutcome::Completed(Ok(204)));

    let writes = handle.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].signal, FeatureFlag::Motion);
    assert_eq!(guard.stats().skipped, 1);
    assert_eq!(guard.stats().completed, 1);
}

#[tokio::test]
async fn test_with_sync_runs_arbitrary_operation() {
    let (guard, handle, _link) = shared_guard(true);
    let value = SyncValue::from("tamper");

    let outcome = guard
        .with_sync(move |channel| {
            async move {
                channel
                    .write(FeatureFlag::Magnetic, "value", value)
                    .await?;
                channel.read(FeatureFlag::Magnetic, "value").await
            }
            .boxed()
        })
        .await;

    assert_eq!(outcome, SyncOutcome::Completed(Ok("tamper".to_string())));
    assert_eq!(handle.max_in_flight(), 1);
}
