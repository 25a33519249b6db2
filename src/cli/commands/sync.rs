use crate::cli::commands::runtime;
use crate::config::Config;
use crate::core::outbox::Outbox;
use crate::core::reconcile::{ReconcileOutcome, Reconciler, SyncTrigger};
use crate::errors::AppResult;
use crate::platform::probe::FlagProbe;
use crate::remote::SqliteRemoteStore;
use crate::ui::messages::{error, info, success, warning};
use std::sync::Arc;

pub fn print_outcome(outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Completed(r) if r.attempted == 0 => info("Outbox is empty, nothing to sync."),
        ReconcileOutcome::Completed(r) if r.failed == 0 => success(format!(
            "Synced {} event(s), {} remaining",
            r.delivered, r.remaining
        )),
        ReconcileOutcome::Completed(r) => warning(format!(
            "Synced {} of {} event(s), {} failed, {} remaining",
            r.delivered, r.attempted, r.failed, r.remaining
        )),
        ReconcileOutcome::Coalesced => info("A sync is already running."),
        ReconcileOutcome::Offline => warning("Network unreachable, nothing was sent."),
        ReconcileOutcome::StorageUnavailable => error("The outbox could not be read."),
    }
}

pub fn handle(cfg: &Config) -> AppResult<()> {
    let outbox = Outbox::open(&cfg.database)?;
    let remote = Arc::new(SqliteRemoteStore::new(&cfg.remote_database));
    let reconciler = Reconciler::new(outbox, remote, Arc::new(FlagProbe::default()));

    let outcome = runtime()?.block_on(reconciler.reconcile(SyncTrigger::Manual));
    print_outcome(&outcome);
    Ok(())
}
