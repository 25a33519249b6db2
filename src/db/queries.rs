use crate::errors::{AppError, AppResult};
use crate::models::event_code::EventCode;
use crate::models::location_event::LocationEvent;
use crate::models::outbox_record::OutboxRecord;
use crate::models::position::Position;
use chrono::{DateTime, Local};
use rusqlite::{Connection, Result, Row, params};
use tracing::warn;
use uuid::Uuid;

fn conversion_error(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

pub fn map_row(row: &Row) -> Result<OutboxRecord> {
    let uid_str: String = row.get("event_uid")?;
    let uid = Uuid::parse_str(&uid_str)
        .map_err(|_| conversion_error(1, AppError::Other(format!("Invalid event uid: {uid_str}"))))?;

    let coord_str: String = row.get("coordinates")?;
    let position = Position::from_coordinates(&coord_str).map_err(|e| conversion_error(3, e))?;

    let captured_str: String = row.get("captured_at")?;
    let captured_at = DateTime::parse_from_rfc3339(&captured_str)
        .map(|dt| dt.with_timezone(&Local))
        .map_err(|_| conversion_error(4, AppError::InvalidTimestamp(captured_str.clone())))?;

    let code_raw: i64 = row.get("code")?;
    let code = EventCode::from_code(code_raw)
        .ok_or_else(|| conversion_error(6, AppError::InvalidEventCode(code_raw)))?;

    Ok(OutboxRecord {
        id: row.get("id")?,
        uid,
        user_id: row.get("user_id")?,
        position,
        captured_at,
        note: row.get("note")?,
        code,
    })
}

/// Insert one event and return the id SQLite assigned to it.
/// The insert runs in its own transaction and is committed before returning.
pub fn insert_record(conn: &mut Connection, ev: &LocationEvent) -> AppResult<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO outbox (event_uid, user_id, coordinates, captured_at, note, code)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            ev.uid.to_string(),
            ev.user_id,
            ev.position.coordinates(),
            ev.timestamp.to_rfc3339(),
            ev.note,
            ev.code.code(),
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

/// All pending records in insertion order.
///
/// A row that cannot be decoded is skipped with a warning and left in place,
/// so it never hides the records queued around it.
pub fn load_pending(conn: &Connection) -> AppResult<Vec<OutboxRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, event_uid, user_id, coordinates, captured_at, note, code
         FROM outbox
         ORDER BY id ASC",
    )?;

    let mut rows = stmt.query([])?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        match map_row(row) {
            Ok(record) => out.push(record),
            Err(e @ rusqlite::Error::FromSqlConversionFailure(..))
            | Err(e @ rusqlite::Error::InvalidColumnType(..)) => {
                let id: i64 = row.get("id")?;
                warn!(outbox_id = id, error = %e, "skipping undecodable outbox row");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(out)
}

/// Delete one record. Returns false when no row had that id.
pub fn delete_record(conn: &Connection, id: i64) -> AppResult<bool> {
    let affected = conn.execute("DELETE FROM outbox WHERE id = ?1", [id])?;
    Ok(affected > 0)
}

pub fn count_pending(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))
}
