use async_trait::async_trait;
use rtracklogger::core::outbox::Outbox;
use rtracklogger::core::reconcile::{ReconcileOutcome, ReconcileReport, Reconciler, SyncTrigger};
use rtracklogger::models::event_code::EventCode;
use rtracklogger::models::location_event::LocationEvent;
use rtracklogger::models::position::Position;
use rtracklogger::platform::probe::FlagProbe;
use rtracklogger::remote::{MemorySink, RemoteSink, SinkError};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

mod common;
use common::{event, fresh_outbox, local};

#[tokio::test]
async fn test_reconcile_delivers_and_empties_outbox() {
    let outbox = fresh_outbox("reconcile_all");
    let sink = Arc::new(MemorySink::new());
    let t = local(2026, 3, 2, 9, 0, 0);

    let queued = [
        event(1, EventCode::NoNetwork, t),
        event(1, EventCode::NoNetwork, t),
        event(2, EventCode::NoGps, t),
    ];
    for ev in &queued {
        outbox.enqueue(ev).await.expect("enqueue");
    }

    let reconciler = Reconciler::new(outbox.clone(), sink.clone(), Arc::new(FlagProbe::default()));
    let outcome = reconciler.reconcile(SyncTrigger::Manual).await;

    assert_eq!(
        outcome,
        ReconcileOutcome::Completed(ReconcileReport {
            attempted: 3,
            delivered: 3,
            failed: 0,
            remaining: 0,
        })
    );
    let uids: Vec<_> = sink.rows().iter().map(|r| r.uid).collect();
    assert_eq!(uids, queued.iter().map(|e| e.uid).collect::<Vec<_>>());

    // running again with an empty outbox changes nothing
    let again = reconciler.reconcile(SyncTrigger::Timer).await;
    assert_eq!(again, ReconcileOutcome::Completed(ReconcileReport::default()));
    assert_eq!(sink.rows().len(), 3);
}

#[tokio::test]
async fn test_partial_failure_keeps_rejected_record() {
    let outbox = fresh_outbox("reconcile_partial");
    let sink = Arc::new(MemorySink::new());
    let t = local(2026, 3, 2, 9, 0, 0);

    let a = event(1, EventCode::Moving, t);
    let b = event(1, EventCode::Stationary, t);
    let c = event(1, EventCode::Moving, t);
    for ev in [&a, &b, &c] {
        outbox.enqueue(ev).await.expect("enqueue");
    }
    sink.reject(b.uid);

    let reconciler = Reconciler::new(outbox.clone(), sink.clone(), Arc::new(FlagProbe::default()));
    match reconciler.reconcile(SyncTrigger::Manual).await {
        ReconcileOutcome::Completed(r) => {
            assert_eq!((r.attempted, r.delivered, r.failed, r.remaining), (3, 2, 1, 1));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let pending = outbox.list_pending().await.expect("list");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].uid, b.uid);

    sink.accept(b.uid);
    reconciler.reconcile(SyncTrigger::ConnectivityRestored).await;
    assert_eq!(outbox.pending_count().await.expect("count"), 0);
    assert_eq!(sink.rows().len(), 3);
}

#[tokio::test]
async fn test_offline_reconcile_does_not_touch_sink() {
    let outbox = fresh_outbox("reconcile_offline");
    let sink = Arc::new(MemorySink::new());
    outbox
        .enqueue(&event(1, EventCode::NoNetwork, local(2026, 3, 2, 9, 0, 0)))
        .await
        .expect("enqueue");

    let probe = Arc::new(FlagProbe::new(true, false));
    let reconciler = Reconciler::new(outbox.clone(), sink.clone(), probe);

    assert_eq!(reconciler.reconcile(SyncTrigger::Timer).await, ReconcileOutcome::Offline);
    assert_eq!(sink.write_attempts(), 0);
    assert_eq!(outbox.pending_count().await.expect("count"), 1);
}

#[tokio::test]
async fn test_unreachable_sink_leaves_everything_queued() {
    let outbox = fresh_outbox("reconcile_unreachable");
    let sink = Arc::new(MemorySink::new());
    sink.set_accepting(false);
    let t = local(2026, 3, 2, 9, 0, 0);
    outbox.enqueue(&event(1, EventCode::Moving, t)).await.expect("enqueue");
    outbox.enqueue(&event(1, EventCode::Moving, t)).await.expect("enqueue");

    let reconciler = Reconciler::new(outbox.clone(), sink.clone(), Arc::new(FlagProbe::default()));
    match reconciler.reconcile(SyncTrigger::Manual).await {
        ReconcileOutcome::Completed(r) => assert_eq!((r.delivered, r.failed, r.remaining), (0, 2, 2)),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_triggers_coalesce() {
    let outbox = fresh_outbox("reconcile_coalesce");
    let sink = Arc::new(MemorySink::new());
    let t = local(2026, 3, 2, 9, 0, 0);
    for _ in 0..20 {
        outbox.enqueue(&event(4, EventCode::Moving, t)).await.expect("enqueue");
    }

    let reconciler = Arc::new(Reconciler::new(
        outbox.clone(),
        sink.clone(),
        Arc::new(FlagProbe::default()),
    ));

    let (a, b) = tokio::join!(
        reconciler.reconcile(SyncTrigger::Timer),
        reconciler.reconcile(SyncTrigger::ConnectivityRestored)
    );

    let coalesced = [a, b]
        .iter()
        .filter(|o| **o == ReconcileOutcome::Coalesced)
        .count();
    assert_eq!(coalesced, 1);

    // every record reached the sink exactly once
    assert_eq!(sink.rows().len(), 20);
    assert_eq!(sink.write_attempts(), 20);
    assert_eq!(outbox.pending_count().await.expect("count"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_periodic_reconcile_stops_on_cancel() {
    let outbox = fresh_outbox("reconcile_periodic");
    let sink = Arc::new(MemorySink::new());
    outbox
        .enqueue(&event(1, EventCode::Moving, local(2026, 3, 2, 9, 0, 0)))
        .await
        .expect("enqueue");

    let reconciler = Arc::new(Reconciler::new(
        outbox.clone(),
        sink.clone(),
        Arc::new(FlagProbe::default()),
    ));
    let cancel = CancellationToken::new();
    let task = reconciler.spawn_periodic(Duration::from_secs(300), cancel.clone());

    // nothing happens before the first period elapses
    tokio::time::sleep(Duration::from_secs(299)).await;
    assert_eq!(sink.write_attempts(), 0);

    for _ in 0..10 {
        if sink.rows().len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    assert_eq!(sink.rows().len(), 1);

    cancel.cancel();
    task.await.expect("timer task ends");
}

#[tokio::test]
async fn test_undecodable_record_does_not_block_the_queue() {
    let outbox = fresh_outbox("reconcile_undecodable");
    let sink = Arc::new(MemorySink::new());
    let t = local(2026, 3, 2, 9, 0, 0);

    let before = event(1, EventCode::NoNetwork, t);
    outbox.enqueue(&before).await.expect("enqueue");
    {
        let conn = Connection::open(outbox.path()).expect("open outbox db");
        conn.execute(
            "INSERT INTO outbox (event_uid, user_id, coordinates, captured_at, note, code)
             VALUES ('0190f0a4-0000-7000-8000-000000000001', 2, '95,7', ?1, 'bad', 2)",
            [t.to_rfc3339()],
        )
        .expect("insert undecodable row");
    }
    let after = event(1, EventCode::Moving, t);
    outbox.enqueue(&after).await.expect("enqueue");

    let pending = outbox.list_pending().await.expect("list skips the bad row");
    assert_eq!(pending.len(), 2);

    let reconciler = Reconciler::new(outbox.clone(), sink.clone(), Arc::new(FlagProbe::default()));
    match reconciler.reconcile(SyncTrigger::Manual).await {
        ReconcileOutcome::Completed(r) => {
            assert_eq!((r.attempted, r.delivered, r.failed, r.remaining), (2, 2, 0, 1));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let uids: Vec<_> = sink.rows().iter().map(|r| r.uid).collect();
    assert_eq!(uids, vec![before.uid, after.uid]);
}

/// Accepts every write, and takes the outbox storage away on the first one.
struct StorageLosingSink {
    dir: PathBuf,
    inner: MemorySink,
}

#[async_trait]
impl RemoteSink for StorageLosingSink {
    async fn write(&self, event: &LocationEvent) -> Result<(), SinkError> {
        fs::remove_dir_all(&self.dir).ok();
        self.inner.write(event).await
    }

    async fn last_coordinates(&self, user_id: i64) -> Result<Option<Position>, SinkError> {
        self.inner.last_coordinates(user_id).await
    }
}

#[tokio::test]
async fn test_storage_lost_mid_pass_still_reports() {
    let dir = std::env::temp_dir().join("reconcile_storage_lost_rtracklogger");
    fs::remove_dir_all(&dir).ok();
    let outbox = Outbox::open(dir.join("outbox.sqlite")).expect("open outbox");
    outbox
        .enqueue(&event(1, EventCode::Moving, local(2026, 3, 2, 9, 0, 0)))
        .await
        .expect("enqueue");

    let sink = Arc::new(StorageLosingSink {
        dir: dir.clone(),
        inner: MemorySink::new(),
    });
    let reconciler = Reconciler::new(outbox.clone(), sink.clone(), Arc::new(FlagProbe::default()));

    // the confirmed write counts as delivered even though removal and the
    // final count both fail
    assert_eq!(
        reconciler.reconcile(SyncTrigger::Manual).await,
        ReconcileOutcome::Completed(ReconcileReport {
            attempted: 1,
            delivered: 1,
            failed: 0,
            remaining: 0,
        })
    );
    assert_eq!(sink.inner.rows().len(), 1);
}
