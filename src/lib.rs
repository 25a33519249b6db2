//! rTrackLogger library root.
//! Exposes CLI parser, high-level run() function, and internal modules.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod logging;
pub mod models;
pub mod platform;
pub mod remote;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use utils::path::expand_tilde;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, cfg),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg),
        Commands::Pending { .. } => cli::commands::pending::handle(&cli.command, cfg),
        Commands::Sync => cli::commands::sync::handle(cfg),
        Commands::Boot { .. } => cli::commands::boot::handle(&cli.command, cfg),
        Commands::Track { .. } => cli::commands::track::handle(&cli.command, cfg),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();

    // `init` writes a fresh config; a broken existing one must not block it.
    let mut cfg = match (&cli.command, Config::load()) {
        (Commands::Init, Err(_)) => Config::default(),
        (_, loaded) => loaded?,
    };

    if let Some(custom_db) = &cli.db {
        cfg.database = expand_tilde(custom_db).to_string_lossy().to_string();
    }
    if let Some(custom_remote) = &cli.remote_db {
        cfg.remote_database = expand_tilde(custom_remote).to_string_lossy().to_string();
    }

    logging::init(&cfg.log_level);

    dispatch(&cli, &cfg)
}
