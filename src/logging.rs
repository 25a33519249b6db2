//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`, so stdout stays reserved for
//! command output. `RUST_LOG` wins over the configured level.

use tracing_subscriber::EnvFilter;

pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A second call (tests running several commands in one process) is a no-op.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
