//! Tracking supervisor.
//!
//! Owns one tracker task per active user. A tracker task owns that user's
//! classifier state and processes its commands one at a time, so fixes of a
//! user are never classified concurrently while different users proceed
//! independently. Every emission, whatever produced it (fix, periodic check,
//! boot or shutdown), is routed by the same decision in `Shared::route`.

use crate::config::Config;
use crate::core::classifier::{ClassifierPolicy, MovementClassifier, TrackerState};
use crate::core::clock::{Clock, SystemClock};
use crate::core::outbox::Outbox;
use crate::core::reconcile::{ReconcileOutcome, Reconciler, SyncTrigger};
use crate::core::window::ActiveWindow;
use crate::errors::{AppError, AppResult};
use crate::models::event_code::EventCode;
use crate::models::location_event::LocationEvent;
use crate::models::position::{Fix, Position};
use crate::platform::probe::EnvironmentProbe;
use crate::remote::{RemoteSink, UserSettingsSource};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const TRACKER_QUEUE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupervisorSettings {
    pub policy: ClassifierPolicy,
    pub window: ActiveWindow,
    pub check_interval: Duration,
    pub reconcile_interval: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            policy: ClassifierPolicy::default(),
            window: ActiveWindow::default(),
            check_interval: Duration::from_secs(60),
            reconcile_interval: Duration::from_secs(300),
        }
    }
}

impl SupervisorSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            policy: ClassifierPolicy {
                movement_threshold_m: cfg.movement_threshold_m,
                min_interval: cfg.min_interval(),
            },
            window: cfg.active_window(),
            check_interval: cfg.check_interval(),
            reconcile_interval: cfg.reconcile_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueueReason {
    NetworkUnreachable,
    PositioningDisabled,
    SinkFailed,
}

/// Where an emitted event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dispatch {
    /// Written to the remote store directly.
    Delivered,
    /// Stored in the outbox for a later reconciliation pass.
    Queued { id: i64, reason: QueueReason },
    /// Outside the active window; nothing was written.
    Gated,
    /// Neither the remote store nor the outbox accepted it.
    Lost,
}

enum TrackerCommand {
    Fix {
        fix: Fix,
        reply: oneshot::Sender<Option<Dispatch>>,
    },
    Check,
    Shutdown {
        reply: oneshot::Sender<Option<Dispatch>>,
    },
    Snapshot {
        reply: oneshot::Sender<TrackerState>,
    },
}

struct TrackerHandle {
    tx: mpsc::Sender<TrackerCommand>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    ticker: JoinHandle<()>,
}

struct Shared {
    outbox: Outbox,
    sink: Arc<dyn RemoteSink>,
    settings_source: Arc<dyn UserSettingsSource>,
    probe: Arc<dyn EnvironmentProbe>,
    clock: Arc<dyn Clock>,
    settings: SupervisorSettings,
    reconciler: Arc<Reconciler>,
}

impl Shared {
    /// The single routing decision used by every emission path.
    async fn route(&self, event: LocationEvent) -> Dispatch {
        if !self.settings.window.contains(event.timestamp.time()) {
            debug!(user_id = event.user_id, code = event.code.code(), "outside active window, event dropped");
            return Dispatch::Gated;
        }

        if !self.probe.network_reachable() {
            return self.enqueue(event, QueueReason::NetworkUnreachable).await;
        }
        if !self.probe.positioning_enabled() {
            return self.enqueue(event, QueueReason::PositioningDisabled).await;
        }

        match self.sink.write(&event).await {
            Ok(()) => {
                info!(user_id = event.user_id, code = event.code.code(), "event delivered");
                Dispatch::Delivered
            }
            Err(e) => {
                warn!(user_id = event.user_id, error = %e, "direct write failed, falling back to outbox");
                self.enqueue(event, QueueReason::SinkFailed).await
            }
        }
    }

    async fn enqueue(&self, event: LocationEvent, reason: QueueReason) -> Dispatch {
        match self.outbox.enqueue(&event).await {
            Ok(id) => Dispatch::Queued { id, reason },
            Err(_) => Dispatch::Lost,
        }
    }

    async fn handle_fix(
        &self,
        user_id: i64,
        classifier: &mut MovementClassifier,
        fix: Fix,
    ) -> Option<Dispatch> {
        let Position { latitude, longitude } = fix.position;
        if let Err(e) = Position::checked(latitude, longitude) {
            warn!(user_id, error = %e, "fix ignored");
            return None;
        }

        let now = self.clock.now();
        let classified = classifier.observe(fix, now)?;

        debug!(user_id, classification = ?classified.classification, "fix classified");
        let event = LocationEvent::new(user_id, classified.position, classified.classification.code(), now);
        Some(self.route(event).await)
    }

    /// Periodic check: while the environment is degraded, keep reporting the
    /// last known position so the outbox shows why tracking went quiet.
    async fn handle_check(&self, user_id: i64, classifier: &mut MovementClassifier) -> Option<Dispatch> {
        let network = self.probe.network_reachable();
        let positioning = self.probe.positioning_enabled();
        if network && positioning {
            return None;
        }

        let now = self.clock.now();
        let last = classifier.last_fix()?;
        if !classifier.interval_elapsed(now) {
            return None;
        }

        let code = if !network {
            EventCode::NoNetwork
        } else {
            EventCode::NoGps
        };
        classifier.mark_emitted(now);

        let event = LocationEvent::new(user_id, last.position, code, now);
        Some(self.route(event).await)
    }

    /// Device-stopping report. Without a local fix, the last position the
    /// remote store knows for the user is used instead.
    async fn report_stopping(&self, user_id: i64, last: Option<Position>) -> Option<Dispatch> {
        let position = match last {
            Some(p) => p,
            None => match self.sink.last_coordinates(user_id).await {
                Ok(Some(p)) => p,
                Ok(None) => {
                    debug!(user_id, "no known position, nothing to report on shutdown");
                    return None;
                }
                Err(e) => {
                    warn!(user_id, error = %e, "no local fix and remote position unavailable");
                    return None;
                }
            },
        };

        let event = LocationEvent::new(user_id, position, EventCode::DeviceStopping, self.clock.now());
        Some(self.route(event).await)
    }
}

async fn run_tracker(
    user_id: i64,
    mut classifier: MovementClassifier,
    mut rx: mpsc::Receiver<TrackerCommand>,
    shared: Arc<Shared>,
) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            TrackerCommand::Fix { fix, reply } => {
                let out = shared.handle_fix(user_id, &mut classifier, fix).await;
                let _ = reply.send(out);
            }
            TrackerCommand::Check => {
                let _ = shared.handle_check(user_id, &mut classifier).await;
            }
            TrackerCommand::Shutdown { reply } => {
                let last = classifier.last_fix().map(|f| f.position);
                let out = shared.report_stopping(user_id, last).await;
                let _ = reply.send(out);
            }
            TrackerCommand::Snapshot { reply } => {
                let _ = reply.send(classifier.state().clone());
            }
        }
    }
    debug!(user_id, "tracker stopped");
}

async fn run_ticker(tx: mpsc::Sender<TrackerCommand>, period: Duration, cancel: CancellationToken) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A full queue already has work pending; skip this check.
                if let Err(mpsc::error::TrySendError::Closed(_)) = tx.try_send(TrackerCommand::Check) {
                    break;
                }
            }
            () = cancel.cancelled() => break,
        }
    }
}

pub struct SupervisorBuilder {
    outbox: Outbox,
    sink: Arc<dyn RemoteSink>,
    settings_source: Arc<dyn UserSettingsSource>,
    probe: Arc<dyn EnvironmentProbe>,
    clock: Arc<dyn Clock>,
    settings: SupervisorSettings,
}

impl SupervisorBuilder {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(mut self, settings: SupervisorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> Supervisor {
        let reconciler = Arc::new(Reconciler::new(
            self.outbox.clone(),
            Arc::clone(&self.sink),
            Arc::clone(&self.probe),
        ));

        Supervisor {
            shared: Arc::new(Shared {
                outbox: self.outbox,
                sink: self.sink,
                settings_source: self.settings_source,
                probe: self.probe,
                clock: self.clock,
                settings: self.settings,
                reconciler,
            }),
            trackers: Mutex::new(HashMap::new()),
            cancel: CancellationToken::new(),
            reconcile_task: Mutex::new(None),
        }
    }
}

pub struct Supervisor {
    shared: Arc<Shared>,
    trackers: Mutex<HashMap<i64, TrackerHandle>>,
    cancel: CancellationToken,
    reconcile_task: Mutex<Option<JoinHandle<()>>>,
}

impl Supervisor {
    pub fn builder(
        outbox: Outbox,
        sink: Arc<dyn RemoteSink>,
        settings_source: Arc<dyn UserSettingsSource>,
        probe: Arc<dyn EnvironmentProbe>,
    ) -> SupervisorBuilder {
        SupervisorBuilder {
            outbox,
            sink,
            settings_source,
            probe,
            clock: Arc::new(SystemClock),
            settings: SupervisorSettings::default(),
        }
    }

    pub fn outbox(&self) -> &Outbox {
        &self.shared.outbox
    }

    pub fn is_tracking(&self, user_id: i64) -> bool {
        self.trackers.lock().contains_key(&user_id)
    }

    pub fn tracked_users(&self) -> Vec<i64> {
        let mut users: Vec<i64> = self.trackers.lock().keys().copied().collect();
        users.sort_unstable();
        users
    }

    /// Start the tracker task and periodic check for a user. Per-user settings
    /// are fetched once here; a missing row or a failed fetch means defaults.
    pub async fn start_tracking(&self, user_id: i64) -> AppResult<()> {
        if self.is_tracking(user_id) {
            return Ok(());
        }

        let overrides = match self.shared.settings_source.user_settings(user_id).await {
            Ok(s) => s,
            Err(e) => {
                warn!(user_id, error = %e, "user settings unavailable, using defaults");
                None
            }
        };
        let policy = self.shared.settings.policy.with_settings(overrides);

        let mut trackers = self.trackers.lock();
        if trackers.contains_key(&user_id) {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel(TRACKER_QUEUE);
        let cancel = self.cancel.child_token();
        let worker = tokio::spawn(run_tracker(
            user_id,
            MovementClassifier::new(policy),
            rx,
            Arc::clone(&self.shared),
        ));
        let ticker = tokio::spawn(run_ticker(
            tx.clone(),
            self.shared.settings.check_interval,
            cancel.clone(),
        ));

        trackers.insert(
            user_id,
            TrackerHandle {
                tx,
                cancel,
                worker,
                ticker,
            },
        );

        info!(
            user_id,
            threshold_m = policy.movement_threshold_m,
            min_interval_s = policy.min_interval.as_secs(),
            "tracking started"
        );
        Ok(())
    }

    /// Stop a user's tracker. Commands already queued, including in-flight
    /// writes, are completed before this returns. Returns false when the user
    /// was not tracked.
    pub async fn stop_tracking(&self, user_id: i64) -> AppResult<bool> {
        let Some(handle) = self.trackers.lock().remove(&user_id) else {
            return Ok(false);
        };

        handle.cancel.cancel();
        drop(handle.tx);
        handle.ticker.await?;
        handle.worker.await?;

        info!(user_id, "tracking stopped");
        Ok(true)
    }

    fn sender(&self, user_id: i64) -> Option<mpsc::Sender<TrackerCommand>> {
        self.trackers.lock().get(&user_id).map(|h| h.tx.clone())
    }

    /// Feed a fix for a user, starting a tracker for users not seen before.
    /// Returns where the resulting event went, or `None` when the fix did not
    /// produce an event. Fixes outside the WGS84 ranges produce none.
    pub async fn on_fix(&self, user_id: i64, fix: Fix) -> AppResult<Option<Dispatch>> {
        self.start_tracking(user_id).await?;
        let tx = self.sender(user_id).ok_or(AppError::TrackerClosed(user_id))?;

        let (reply, rx) = oneshot::channel();
        tx.send(TrackerCommand::Fix { fix, reply })
            .await
            .map_err(|_| AppError::TrackerClosed(user_id))?;
        rx.await.map_err(|_| AppError::TrackerClosed(user_id))
    }

    /// Run the periodic degraded-environment check for a user right away.
    pub async fn check_now(&self, user_id: i64) -> AppResult<()> {
        let tx = self.sender(user_id).ok_or(AppError::TrackerClosed(user_id))?;
        tx.send(TrackerCommand::Check)
            .await
            .map_err(|_| AppError::TrackerClosed(user_id))?;
        Ok(())
    }

    /// Copy of a user's tracker state, after all previously queued commands.
    pub async fn tracker_state(&self, user_id: i64) -> Option<TrackerState> {
        let tx = self.sender(user_id)?;
        let (reply, rx) = oneshot::channel();
        tx.send(TrackerCommand::Snapshot { reply }).await.ok()?;
        rx.await.ok()
    }

    /// Final best-effort report before the device powers off.
    pub async fn on_shutdown_imminent(&self, user_id: i64) -> AppResult<Option<Dispatch>> {
        if let Some(tx) = self.sender(user_id) {
            let (reply, rx) = oneshot::channel();
            if tx.send(TrackerCommand::Shutdown { reply }).await.is_ok()
                && let Ok(out) = rx.await
            {
                return Ok(out);
            }
        }

        Ok(self.shared.report_stopping(user_id, None).await)
    }

    /// Record that the device started, then begin tracking the user.
    pub async fn on_boot(&self, user_id: i64) -> AppResult<Dispatch> {
        let event = LocationEvent::new(user_id, Position::origin(), EventCode::Boot, self.shared.clock.now());
        let out = self.shared.route(event).await;
        self.start_tracking(user_id).await?;
        Ok(out)
    }

    pub async fn on_connectivity_restored(&self) -> ReconcileOutcome {
        self.shared
            .reconciler
            .reconcile(SyncTrigger::ConnectivityRestored)
            .await
    }

    /// Explicit caller-initiated sync (e.g. right after login).
    pub async fn sync_now(&self) -> ReconcileOutcome {
        self.shared.reconciler.reconcile(SyncTrigger::Manual).await
    }

    /// Start the periodic reconciliation timer. Calling it twice is a no-op.
    pub fn start_reconcile_timer(&self) {
        let mut task = self.reconcile_task.lock();
        if task.is_none() {
            *task = Some(
                self.shared
                    .reconciler
                    .spawn_periodic(self.shared.settings.reconcile_interval, self.cancel.child_token()),
            );
        }
    }

    /// Stop every tracker and the reconciliation timer.
    pub async fn shutdown(&self) -> AppResult<()> {
        for user_id in self.tracked_users() {
            self.stop_tracking(user_id).await?;
        }

        self.cancel.cancel();
        let task = self.reconcile_task.lock().take();
        if let Some(task) = task {
            task.await?;
        }
        Ok(())
    }
}
