//! `track`: the long-running agent.
//!
//! Live mode reads host notifications as JSON lines on stdin, for example:
//!
//! ```text
//! {"type":"fix","user_id":7,"latitude":45.07,"longitude":7.68}
//! {"type":"network","reachable":false}
//! {"type":"shutdown","user_id":7}
//! ```
//!
//! End of input stops every tracker after in-flight work completes. Ctrl-C
//! first reports a device-stopping event for each tracked user.
//!
//! Replay mode feeds a CSV of recorded fixes through the same engine with a
//! clock that follows the fix timestamps.

use crate::cli::commands::sync::print_outcome;
use crate::cli::commands::{build_supervisor, report_dispatch, runtime};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::clock::{ManualClock, SystemClock};
use crate::core::supervisor::{Dispatch, Supervisor};
use crate::errors::AppResult;
use crate::models::position::{Fix, Position};
use crate::platform::probe::FlagProbe;
use crate::platform::signals::{HostSignal, read_replay};
use crate::ui::messages::{info, success, warning};
use chrono::{Local, Utc};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info as trace_info};

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Track {
        user,
        replay,
        offline,
    } = cmd
    else {
        return Ok(());
    };

    let rt = runtime()?;
    match replay {
        Some(path) => rt.block_on(run_replay(path, *offline, cfg)),
        None => rt.block_on(run_live(user.or(cfg.default_user_id), cfg)),
    }
}

async fn apply_signal(supervisor: &Supervisor, probe: &FlagProbe, signal: HostSignal) -> AppResult<()> {
    debug!(?signal, "host signal");

    match signal {
        HostSignal::Fix {
            user_id,
            latitude,
            longitude,
            timestamp,
        } => {
            let position = match Position::checked(latitude, longitude) {
                Ok(p) => p,
                Err(e) => {
                    warning(format!("user {user_id}: fix ignored, {e}"));
                    return Ok(());
                }
            };
            let fix = Fix {
                position,
                timestamp: timestamp.unwrap_or_else(Utc::now),
            };
            let dispatch = supervisor.on_fix(user_id, fix).await?;
            report_dispatch(user_id, "location", dispatch);
        }
        HostSignal::Network { reachable } => {
            if probe.set_network(reachable) {
                print_outcome(&supervisor.on_connectivity_restored().await);
            }
        }
        HostSignal::Positioning { enabled } => {
            if probe.set_positioning(enabled) {
                print_outcome(&supervisor.on_connectivity_restored().await);
            }
        }
        HostSignal::Start { user_id } => {
            supervisor.start_tracking(user_id).await?;
            info(format!("user {user_id}: tracking started"));
        }
        HostSignal::Stop { user_id } => {
            if supervisor.stop_tracking(user_id).await? {
                info(format!("user {user_id}: tracking stopped"));
            }
        }
        HostSignal::Shutdown { user_id } => {
            let dispatch = supervisor.on_shutdown_imminent(user_id).await?;
            report_dispatch(user_id, "shutdown", dispatch);
        }
        HostSignal::Boot { user_id } => {
            let dispatch = supervisor.on_boot(user_id).await?;
            report_dispatch(user_id, "boot", Some(dispatch));
        }
        HostSignal::Sync => print_outcome(&supervisor.sync_now().await),
    }

    Ok(())
}

async fn run_live(user: Option<i64>, cfg: &Config) -> AppResult<()> {
    let probe = Arc::new(FlagProbe::default());
    let supervisor = build_supervisor(cfg, probe.clone(), Arc::new(SystemClock))?;

    supervisor.start_reconcile_timer();
    if let Some(user_id) = user {
        supervisor.start_tracking(user_id).await?;
    }
    trace_info!(outbox = %supervisor.outbox().path().display(), "agent running");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match HostSignal::parse_line(&line) {
                    Ok(Some(signal)) => apply_signal(&supervisor, &probe, signal).await?,
                    Ok(None) => {}
                    Err(e) => warning(format!("Ignoring invalid signal: {e}")),
                }
            }
            res = tokio::signal::ctrl_c() => {
                res?;
                for user_id in supervisor.tracked_users() {
                    let dispatch = supervisor.on_shutdown_imminent(user_id).await?;
                    report_dispatch(user_id, "shutdown", dispatch);
                }
                break;
            }
        }
    }

    supervisor.shutdown().await?;
    success("Agent stopped.");
    Ok(())
}

#[derive(Default)]
struct ReplaySummary {
    fixes: usize,
    delivered: usize,
    queued: usize,
    gated: usize,
    lost: usize,
}

impl ReplaySummary {
    fn record(&mut self, dispatch: Option<Dispatch>) {
        self.fixes += 1;
        match dispatch {
            Some(Dispatch::Delivered) => self.delivered += 1,
            Some(Dispatch::Queued { .. }) => self.queued += 1,
            Some(Dispatch::Gated) => self.gated += 1,
            Some(Dispatch::Lost) => self.lost += 1,
            None => {}
        }
    }
}

async fn run_replay(path: &Path, offline: bool, cfg: &Config) -> AppResult<()> {
    let rows = read_replay(path)?;

    let clock = Arc::new(ManualClock::new(Local::now()));
    let probe = Arc::new(FlagProbe::new(true, !offline));
    let supervisor = build_supervisor(cfg, probe, clock.clone())?;

    let mut summary = ReplaySummary::default();
    for row in &rows {
        let fix = row.to_fix()?;
        clock.set(fix.timestamp.with_timezone(&Local));
        let dispatch = supervisor.on_fix(row.user_id, fix).await?;
        summary.record(dispatch);
    }

    supervisor.shutdown().await?;

    success(format!(
        "Replayed {} fix(es): {} delivered, {} queued, {} outside active hours, {} lost",
        summary.fixes, summary.delivered, summary.queued, summary.gated, summary.lost
    ));
    Ok(())
}
