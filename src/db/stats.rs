use crate::db::pool::DbPool;
use crate::db::queries::count_pending;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use crate::utils::time::display_rfc3339;
use rusqlite::OptionalExtension;
use std::fs;

pub fn print_db_info(pool: &mut DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_kb = (file_size as f64) / 1024.0;

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.1} KB", CYAN, RESET, file_kb);

    //
    // 2) PENDING RECORDS
    //
    let count = count_pending(&pool.conn)?;
    println!(
        "{}• Pending records:{} {}{}{}",
        CYAN, RESET, GREEN, count, RESET
    );

    let users: i64 = pool
        .conn
        .query_row("SELECT COUNT(DISTINCT user_id) FROM outbox", [], |row| {
            row.get(0)
        })?;
    println!("{}• Users with pending records:{} {}", CYAN, RESET, users);

    //
    // 3) CAPTURE RANGE
    //
    let oldest: Option<String> = pool
        .conn
        .query_row(
            "SELECT captured_at FROM outbox ORDER BY id ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let newest: Option<String> = pool
        .conn
        .query_row(
            "SELECT captured_at FROM outbox ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    println!("{}• Captured:{}", CYAN, RESET);
    println!("    oldest: {}", fmt_capture(oldest.as_deref()));
    println!("    newest: {}", fmt_capture(newest.as_deref()));

    println!();
    Ok(())
}

fn fmt_capture(raw: Option<&str>) -> String {
    match raw {
        Some(s) => display_rfc3339(s),
        None => format!("{GREY}--{RESET}"),
    }
}
