//! SQLite connection wrapper for the outbox database.
//!
//! Connections are short-lived: every outbox operation opens one, uses it and
//! drops it. Concurrent writers are serialised by SQLite itself (WAL + busy
//! timeout), the crate holds no lock of its own around storage.

use rusqlite::{Connection, Result};
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct DbPool {
    pub conn: Connection,
}

impl DbPool {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = FULL;",
        )?;
        Ok(Self { conn })
    }
}
