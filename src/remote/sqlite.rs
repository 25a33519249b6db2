//! Remote store backed by a SQLite file.
//!
//! A connection is opened for every operation and dropped right after, the
//! store keeps nothing open between calls. The file is never created
//! implicitly: a missing file means the store is unreachable.

use super::{RemoteSink, SinkError, UserSettingsSource};
use crate::models::location_event::LocationEvent;
use crate::models::position::Position;
use crate::models::user_settings::UserSettings;
use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SqliteRemoteStore {
    path: PathBuf,
}

impl SqliteRemoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the remote tables (used by `init` and tests).
    pub fn init_schema(path: impl AsRef<Path>) -> rusqlite::Result<()> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS track_points (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id      INTEGER NOT NULL,
                coordinates  TEXT NOT NULL,
                recorded_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now', 'localtime')),
                note         TEXT NOT NULL DEFAULT '',
                code         INTEGER NOT NULL CHECK(code BETWEEN 1 AND 6),
                captured_at  TEXT NOT NULL,
                event_uid    TEXT NOT NULL UNIQUE
            );

            CREATE INDEX IF NOT EXISTS idx_track_points_user ON track_points(user_id, id);

            CREATE TABLE IF NOT EXISTS users (
                id                  INTEGER PRIMARY KEY,
                name                TEXT NOT NULL DEFAULT '',
                wait_interval       INTEGER,
                movement_threshold  INTEGER
            );
            "#,
        )?;
        Ok(())
    }

    fn connect(path: &Path) -> Result<Connection, SinkError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(map_error)?;
        conn.busy_timeout(BUSY_TIMEOUT).map_err(map_error)?;
        Ok(conn)
    }

    /// Run one blocking operation on a fresh connection off the async workers.
    async fn run<F, T>(&self, op: F) -> Result<T, SinkError>
    where
        F: FnOnce(&Connection) -> Result<T, SinkError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&path)?;
            op(&conn)
        })
        .await
        .map_err(|e| SinkError::Storage(format!("remote task failed: {e}")))?
    }
}

fn map_error(err: rusqlite::Error) -> SinkError {
    match err.sqlite_error_code() {
        Some(ErrorCode::CannotOpen)
        | Some(ErrorCode::DatabaseBusy)
        | Some(ErrorCode::DatabaseLocked)
        | Some(ErrorCode::NotADatabase) => SinkError::Unreachable(err.to_string()),
        Some(ErrorCode::ConstraintViolation) => SinkError::Rejected(err.to_string()),
        _ => SinkError::Storage(err.to_string()),
    }
}

#[async_trait]
impl RemoteSink for SqliteRemoteStore {
    async fn write(&self, event: &LocationEvent) -> Result<(), SinkError> {
        let ev = event.clone();
        self.run(move |conn| {
            // A row with the same uid means an earlier attempt already landed.
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO track_points
                        (user_id, coordinates, note, code, captured_at, event_uid)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        ev.user_id,
                        ev.position.coordinates(),
                        ev.note,
                        ev.code.code(),
                        ev.timestamp.to_rfc3339(),
                        ev.uid.to_string(),
                    ],
                )
                .map_err(map_error)?;

            if inserted == 0 {
                debug!(uid = %ev.uid, "remote row already present");
            }
            Ok(())
        })
        .await
    }

    async fn last_coordinates(&self, user_id: i64) -> Result<Option<Position>, SinkError> {
        self.run(move |conn| {
            let coords: Option<String> = conn
                .query_row(
                    "SELECT coordinates FROM track_points
                     WHERE user_id = ?1 AND code <> 4
                     ORDER BY recorded_at DESC, id DESC
                     LIMIT 1",
                    [user_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(map_error)?;

            Ok(coords.and_then(|c| Position::from_coordinates(&c).ok()))
        })
        .await
    }
}

#[async_trait]
impl UserSettingsSource for SqliteRemoteStore {
    async fn user_settings(&self, user_id: i64) -> Result<Option<UserSettings>, SinkError> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT wait_interval, movement_threshold FROM users WHERE id = ?1",
                [user_id],
                |row| {
                    Ok(UserSettings {
                        wait_interval: row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                        movement_threshold: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                    })
                },
            )
            .optional()
            .map_err(map_error)
        })
        .await
    }
}
