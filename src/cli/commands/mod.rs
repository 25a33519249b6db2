pub mod boot;
pub mod config;
pub mod db;
pub mod init;
pub mod log;
pub mod pending;
pub mod sync;
pub mod track;

use crate::config::Config;
use crate::core::clock::Clock;
use crate::core::outbox::Outbox;
use crate::core::supervisor::{Dispatch, Supervisor, SupervisorSettings};
use crate::errors::{AppError, AppResult};
use crate::platform::probe::EnvironmentProbe;
use crate::remote::SqliteRemoteStore;
use crate::ui::messages::{info, warning};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Runtime for the commands that talk to the async engine.
pub(crate) fn runtime() -> AppResult<Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

pub(crate) fn resolve_user(explicit: Option<i64>, cfg: &Config) -> AppResult<i64> {
    explicit.or(cfg.default_user_id).ok_or(AppError::MissingUser)
}

pub(crate) fn build_supervisor(
    cfg: &Config,
    probe: Arc<dyn EnvironmentProbe>,
    clock: Arc<dyn Clock>,
) -> AppResult<Supervisor> {
    let outbox = Outbox::open(&cfg.database)?;
    let remote = Arc::new(SqliteRemoteStore::new(&cfg.remote_database));

    Ok(
        Supervisor::builder(outbox, remote.clone(), remote, probe)
            .clock(clock)
            .settings(SupervisorSettings::from_config(cfg))
            .build(),
    )
}

pub(crate) fn report_dispatch(user_id: i64, what: &str, dispatch: Option<Dispatch>) {
    match dispatch {
        Some(Dispatch::Delivered) => info(format!("user {user_id}: {what} delivered")),
        Some(Dispatch::Queued { id, reason }) => {
            warning(format!("user {user_id}: {what} queued as #{id} ({reason:?})"))
        }
        Some(Dispatch::Gated) => info(format!("user {user_id}: {what} outside active hours")),
        Some(Dispatch::Lost) => warning(format!("user {user_id}: {what} could not be stored")),
        None => {}
    }
}
