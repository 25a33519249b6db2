use crate::models::event_code::EventCode;
use crate::models::position::Position;
use chrono::{Local, NaiveDateTime};
use rusqlite::{Connection, Error, OptionalExtension, Result, params};
use tracing::{info, warn};
use uuid::Uuid;

const ADD_EVENT_UID: &str = "20260412_0002_add_event_uid";
const IMPORT_LEGACY_LOCATIONS: &str = "20260412_0003_import_legacy_locations";

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?1")?;
    let exists: Option<String> = stmt.query_row([name], |row| row.get(0)).optional()?;
    Ok(exists.is_some())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{table}')"))?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (?1, 'migration_applied', ?2, ?3)",
        params![Local::now().to_rfc3339(), version, message],
    )?;
    Ok(())
}

/// Create the `outbox` table with the modern schema (including `event_uid`).
fn create_outbox_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS outbox (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            event_uid    TEXT NOT NULL,
            user_id      INTEGER NOT NULL,
            coordinates  TEXT NOT NULL,
            captured_at  TEXT NOT NULL,
            note         TEXT NOT NULL DEFAULT '',
            code         INTEGER NOT NULL CHECK(code BETWEEN 1 AND 6)
        );

        CREATE INDEX IF NOT EXISTS idx_outbox_user ON outbox(user_id);
        "#,
    )?;
    Ok(())
}

/// Outbox tables created before idempotency tokens existed get a uid per row.
fn migrate_add_event_uid(conn: &Connection) -> Result<()> {
    if is_applied(conn, ADD_EVENT_UID)? || has_column(conn, "outbox", "event_uid")? {
        return Ok(());
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "ALTER TABLE outbox ADD COLUMN event_uid TEXT NOT NULL DEFAULT ''",
        [],
    )?;

    let ids: Vec<i64> = {
        let mut stmt = tx.prepare("SELECT id FROM outbox ORDER BY id ASC")?;
        stmt.query_map([], |row| row.get(0))?
            .collect::<Result<_>>()?
    };

    for id in &ids {
        tx.execute(
            "UPDATE outbox SET event_uid = ?1 WHERE id = ?2",
            params![Uuid::now_v7().to_string(), id],
        )?;
    }

    mark_applied(&tx, ADD_EVENT_UID, "Added event_uid to outbox")?;
    tx.commit()?;

    info!(rows = ids.len(), "migration {ADD_EVENT_UID} applied");
    Ok(())
}

/// A pending row from the device app's `locations` table.
struct LegacyLocation {
    user_id: Option<i64>,
    coordinates: String,
    date: String,
    note: String,
    code: i64,
}

/// Move rows of the legacy `locations` table into the outbox, oldest first.
fn migrate_import_legacy_locations(conn: &Connection) -> Result<()> {
    if is_applied(conn, IMPORT_LEGACY_LOCATIONS)? || !table_exists(conn, "locations")? {
        return Ok(());
    }

    warn!("legacy locations table detected, importing into outbox");

    let legacy: Vec<LegacyLocation> = {
        let mut stmt = conn.prepare(
            "SELECT user_id, coordinates, date, note, code FROM locations ORDER BY id ASC",
        )?;
        stmt.query_map([], |row| {
            Ok(LegacyLocation {
                user_id: row.get(0)?,
                coordinates: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                date: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                note: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
                code: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            })
        })?
        .collect::<Result<_>>()?
    };

    let tx = conn.unchecked_transaction()?;
    let mut imported = 0usize;

    for row in &legacy {
        let Some(user_id) = row.user_id else {
            warn!(coordinates = %row.coordinates, "skipping legacy row without user");
            continue;
        };
        if Position::from_coordinates(&row.coordinates).is_err() {
            warn!(coordinates = %row.coordinates, "skipping legacy row with invalid coordinates");
            continue;
        }

        // The device app stored 0 when it could not tell why it went offline.
        let code = EventCode::from_code(row.code).unwrap_or(EventCode::NoNetwork);

        let captured_at = NaiveDateTime::parse_from_str(&row.date, "%Y-%m-%d %H:%M:%S")
            .ok()
            .and_then(|dt| dt.and_local_timezone(Local).single())
            .unwrap_or_else(Local::now);

        tx.execute(
            "INSERT INTO outbox (event_uid, user_id, coordinates, captured_at, note, code)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                Uuid::now_v7().to_string(),
                user_id,
                row.coordinates,
                captured_at.to_rfc3339(),
                row.note,
                code.code(),
            ],
        )?;
        imported += 1;
    }

    tx.execute_batch("DROP TABLE locations;")?;
    mark_applied(
        &tx,
        IMPORT_LEGACY_LOCATIONS,
        &format!("Imported {imported} legacy locations into outbox"),
    )?;
    tx.commit()?;

    info!(imported, skipped = legacy.len() - imported, "migration {IMPORT_LEGACY_LOCATIONS} applied");
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    let outbox_exists = table_exists(conn, "outbox")?;
    if !outbox_exists {
        create_outbox_table(conn)?;
        info!("created outbox table");
    } else {
        migrate_add_event_uid(conn)?;
    }

    migrate_import_legacy_locations(conn)?;

    let integrity: String = conn.query_row("PRAGMA quick_check;", [], |row| row.get(0))?;
    if integrity != "ok" {
        return Err(Error::SqliteFailure(
            rusqlite::ffi::Error::new(11),
            Some(format!("outbox database failed quick_check: {integrity}")),
        ));
    }

    Ok(())
}
