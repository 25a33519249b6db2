use crate::cli::parser::Cli;
use crate::config::Config;
use crate::core::outbox::Outbox;
use crate::errors::AppResult;
use crate::remote::SqliteRemoteStore;
use crate::ui::messages::{success, warning};
use std::fs;
use std::path::Path;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory and file (skipped in test mode)
///  - the outbox database with all pending migrations
///  - the remote store schema, when its file can be created
pub fn handle(cli: &Cli) -> AppResult<()> {
    let cfg = Config::init_all(cli.db.clone(), cli.remote_db.clone(), cli.test)?;

    println!("⚙️  Initializing rTrackLogger…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Outbox     : {}", &cfg.database);
    println!("🌐 Remote     : {}", &cfg.remote_database);

    let outbox = Outbox::open(&cfg.database)?;
    success(format!("Outbox initialized at {}", outbox.path().display()));

    if let Some(parent) = Path::new(&cfg.remote_database).parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    match SqliteRemoteStore::init_schema(&cfg.remote_database) {
        Ok(()) => success(format!("Remote store ready at {}", &cfg.remote_database)),
        Err(e) => warning(format!("Remote store not initialized: {e}")),
    }

    let pool = crate::db::pool::DbPool::new(&cfg.database)?;
    if let Err(e) = crate::db::log::ttlog(
        &pool.conn,
        "init",
        "outbox",
        &format!("Outbox initialized at {}", &cfg.database),
    ) {
        warning(format!("Failed to write internal log: {e}"));
    }

    println!("🎉 rTrackLogger initialization completed!");
    Ok(())
}
