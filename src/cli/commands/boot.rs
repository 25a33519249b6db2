use crate::cli::commands::{build_supervisor, report_dispatch, resolve_user, runtime};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::clock::SystemClock;
use crate::errors::AppResult;
use crate::platform::probe::FlagProbe;
use std::sync::Arc;

/// Record a device start. Tracking starts and stops with the command; the
/// long-running agent is `track`.
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    let Commands::Boot { user } = cmd else {
        return Ok(());
    };
    let user_id = resolve_user(*user, cfg)?;

    let supervisor = build_supervisor(cfg, Arc::new(FlagProbe::default()), Arc::new(SystemClock))?;
    runtime()?.block_on(async {
        let dispatch = supervisor.on_boot(user_id).await?;
        report_dispatch(user_id, "boot", Some(dispatch));
        supervisor.shutdown().await
    })
}
