use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface definition for rTrackLogger
/// Location tracking agent with a durable SQLite outbox
#[derive(Parser)]
#[command(
    name = "rtracklogger",
    version = env!("CARGO_PKG_VERSION"),
    about = "Location tracking agent: classify fixes, deliver them to a remote store and queue them offline",
    long_about = None
)]
pub struct Cli {
    /// Override outbox database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override remote store database path
    #[arg(global = true, long = "remote-db")]
    pub remote_db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the outbox, the remote store schema and the configuration
    Init,

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/vim/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the outbox database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// List or manage events waiting in the outbox
    Pending {
        #[arg(long = "json", help = "Print pending records as JSON")]
        json: bool,

        #[arg(long = "remove", value_name = "ID", help = "Remove one record by id")]
        remove: Option<i64>,
    },

    /// Deliver pending outbox records to the remote store now
    Sync,

    /// Record a device start for a user
    Boot {
        #[arg(long = "user", value_name = "ID")]
        user: Option<i64>,
    },

    /// Run the tracking agent, reading host signals as JSON lines on stdin
    Track {
        /// User to start tracking immediately
        #[arg(long = "user", value_name = "ID")]
        user: Option<i64>,

        /// Replay fixes from a CSV file (user_id,latitude,longitude,timestamp)
        #[arg(long = "replay", value_name = "FILE")]
        replay: Option<PathBuf>,

        /// Treat the network as unreachable (replay only)
        #[arg(long = "offline", requires = "replay")]
        offline: bool,
    },
}
