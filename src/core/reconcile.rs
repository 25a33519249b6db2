//! Reconciliation: draining the outbox into the remote store.
//!
//! Every trigger (connectivity restored, periodic timer, explicit sync) goes
//! through [`Reconciler::reconcile`]. At most one pass runs at a time; a
//! trigger arriving while a pass is in flight is dropped, the next trigger
//! picks up whatever is left.

use crate::core::outbox::{Outbox, RemoveOutcome};
use crate::platform::probe::EnvironmentProbe;
use crate::remote::RemoteSink;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncTrigger {
    ConnectivityRestored,
    Timer,
    Manual,
}

impl SyncTrigger {
    pub fn label(&self) -> &'static str {
        match self {
            SyncTrigger::ConnectivityRestored => "connectivity",
            SyncTrigger::Timer => "timer",
            SyncTrigger::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileOutcome {
    Completed(ReconcileReport),
    /// Another pass was already running.
    Coalesced,
    /// Network unreachable; the sink was not contacted.
    Offline,
    /// The outbox could not be read.
    StorageUnavailable,
}

pub struct Reconciler {
    outbox: Outbox,
    sink: Arc<dyn RemoteSink>,
    probe: Arc<dyn EnvironmentProbe>,
    in_flight: Mutex<()>,
}

impl Reconciler {
    pub fn new(outbox: Outbox, sink: Arc<dyn RemoteSink>, probe: Arc<dyn EnvironmentProbe>) -> Self {
        Self {
            outbox,
            sink,
            probe,
            in_flight: Mutex::new(()),
        }
    }

    /// One pass over the outbox. Each record is written independently: a
    /// rejected record stays queued and the pass moves on to the next one.
    pub async fn reconcile(&self, trigger: SyncTrigger) -> ReconcileOutcome {
        let Ok(_pass) = self.in_flight.try_lock() else {
            debug!(trigger = trigger.label(), "reconciliation already running, trigger dropped");
            return ReconcileOutcome::Coalesced;
        };

        if !self.probe.network_reachable() {
            debug!(trigger = trigger.label(), "network unreachable, reconciliation skipped");
            return ReconcileOutcome::Offline;
        }

        let pending = match self.outbox.list_pending().await {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "cannot read outbox");
                return ReconcileOutcome::StorageUnavailable;
            }
        };

        let mut report = ReconcileReport::default();

        for record in pending {
            report.attempted += 1;

            if let Err(e) = self.sink.write(&record.to_event()).await {
                warn!(outbox_id = record.id, uid = %record.uid, error = %e, "record not accepted, kept in outbox");
                report.failed += 1;
                continue;
            }

            // The remote row exists from here on; a failed delete only means
            // the record is sent again later and deduplicated by its uid.
            match self.outbox.remove(record.id).await {
                Ok(RemoveOutcome::Removed) | Ok(RemoveOutcome::NotFound) => report.delivered += 1,
                Err(e) => {
                    error!(outbox_id = record.id, error = %e, "delivered record could not be removed");
                    report.delivered += 1;
                }
            }
        }

        report.remaining = match self.outbox.pending_count().await {
            Ok(n) => n as usize,
            Err(e) => {
                warn!(error = %e, "cannot count remaining outbox records");
                report.failed
            }
        };

        if report.attempted > 0 {
            info!(
                trigger = trigger.label(),
                delivered = report.delivered,
                failed = report.failed,
                remaining = report.remaining,
                "reconciliation pass finished"
            );

            let message = format!(
                "delivered {} of {}, {} failed, {} remaining",
                report.delivered, report.attempted, report.failed, report.remaining
            );
            if let Err(e) = self.outbox.log("reconcile", trigger.label(), &message).await {
                warn!(error = %e, "failed to write internal log");
            }
        }

        ReconcileOutcome::Completed(report)
    }

    /// Run a pass every `period` until `cancel` fires.
    pub fn spawn_periodic(self: &Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let reconciler = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // interval() fires immediately; the first pass waits one period.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let _ = reconciler.reconcile(SyncTrigger::Timer).await;
                    }
                    () = cancel.cancelled() => break,
                }
            }
        })
    }
}
