//! Interfaces to the remote store.
//!
//! The remote store is an append-only table of location rows plus a table of
//! per-user settings. Both are reached through async traits so the engine
//! does not care whether the backing store is a database server, a local
//! SQLite file or an in-memory double.

pub mod memory;
pub mod sqlite;

use crate::models::location_event::LocationEvent;
use crate::models::position::Position;
use crate::models::user_settings::UserSettings;
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemorySink;
pub use sqlite::SqliteRemoteStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// The store could not be reached (connectivity, missing store, timeout).
    #[error("remote store unreachable: {0}")]
    Unreachable(String),

    /// The store refused the row (validation, auth).
    #[error("remote store rejected the write: {0}")]
    Rejected(String),

    #[error("remote store failure: {0}")]
    Storage(String),
}

/// Append-only write side of the remote store.
///
/// A failed write is reported to the caller, which owns the retry policy.
/// Implementations must not retry internally.
#[async_trait]
pub trait RemoteSink: Send + Sync {
    /// Insert one row. `Ok(())` means the store confirmed the write.
    async fn write(&self, event: &LocationEvent) -> Result<(), SinkError>;

    /// Most recent coordinates stored for a user, if any.
    async fn last_coordinates(&self, user_id: i64) -> Result<Option<Position>, SinkError>;
}

/// Read side for per-user tunables.
#[async_trait]
pub trait UserSettingsSource: Send + Sync {
    /// `Ok(None)` means the user has no override row, which is not an error.
    async fn user_settings(&self, user_id: i64) -> Result<Option<UserSettings>, SinkError>;
}
