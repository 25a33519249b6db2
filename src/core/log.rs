use crate::db::pool::DbPool;
use crate::errors::AppResult;
use ansi_term::Colour;
use regex::Regex;
use std::sync::LazyLock;

const OP_MAX: usize = 40;
const MESSAGE_WIDTH: usize = 72;

static ANSI: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[mK]").ok());

fn visible_len(s: &str) -> usize {
    match ANSI.as_ref() {
        Some(re) => re.replace_all(s, "").chars().count(),
        None => s.chars().count(),
    }
}

fn color_for_operation(op: &str) -> Colour {
    match op {
        "reconcile" => Colour::Green,
        "remove" => Colour::Red,
        "migration_applied" => Colour::Purple,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

pub struct LogLogic;

impl LogLogic {
    pub fn load(pool: &DbPool) -> AppResult<Vec<LogEntry>> {
        let mut stmt = pool.conn.prepare_cached(
            "SELECT id, date, operation, target, message FROM log ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let raw_date: String = row.get(1)?;
            let date = chrono::DateTime::parse_from_rfc3339(&raw_date)
                .map(|dt| dt.format("%F %T").to_string())
                .unwrap_or(raw_date);

            Ok(LogEntry {
                id: row.get(0)?,
                date,
                operation: row.get(2)?,
                target: row.get(3)?,
                message: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for r in rows {
            entries.push(r?);
        }
        Ok(entries)
    }

    pub fn print_log(pool: &DbPool) -> AppResult<()> {
        let entries = Self::load(pool)?;

        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let id_w = entries
            .iter()
            .map(|e| e.id.to_string().len())
            .max()
            .unwrap_or(1);
        let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(19);

        let labels: Vec<String> = entries
            .iter()
            .map(|e| {
                let label = if e.target.is_empty() {
                    color_for_operation(&e.operation).paint(e.operation.as_str()).to_string()
                } else {
                    format!(
                        "{} ({})",
                        color_for_operation(&e.operation).paint(e.operation.as_str()),
                        e.target
                    )
                };
                if visible_len(&label) > OP_MAX {
                    color_for_operation(&e.operation).paint(e.operation.as_str()).to_string()
                } else {
                    label
                }
            })
            .collect();
        let op_w = labels.iter().map(|l| visible_len(l)).max().unwrap_or(10);

        println!("📜 Internal log:\n");

        let indent = " ".repeat(id_w + date_w + op_w + 9);
        for (entry, label) in entries.iter().zip(labels) {
            let padding = " ".repeat(op_w.saturating_sub(visible_len(&label)));
            let wrapped = textwrap::wrap(&entry.message, MESSAGE_WIDTH);

            let mut lines = wrapped.iter();
            let first = lines.next().map(|l| l.to_string()).unwrap_or_default();
            println!(
                "{:>id_w$}: {:<date_w$} | {}{} => {}",
                entry.id,
                entry.date,
                label,
                padding,
                first,
                id_w = id_w,
                date_w = date_w
            );
            for line in lines {
                println!("{indent}{line}");
            }
        }

        Ok(())
    }
}
