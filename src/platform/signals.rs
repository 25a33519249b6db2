//! Decoding of host notifications and recorded fix files.

use crate::errors::{AppError, AppResult};
use crate::models::position::Fix;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// One notification from the host process, read as a JSON line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostSignal {
    Fix {
        user_id: i64,
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
    Network {
        reachable: bool,
    },
    Positioning {
        enabled: bool,
    },
    Start {
        user_id: i64,
    },
    Stop {
        user_id: i64,
    },
    Shutdown {
        user_id: i64,
    },
    Boot {
        user_id: i64,
    },
    Sync,
}

impl HostSignal {
    /// Blank lines and `#` comments yield `None`.
    pub fn parse_line(line: &str) -> AppResult<Option<Self>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(trimmed)?))
    }
}

/// One row of a replay CSV: `user_id,latitude,longitude,timestamp`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayRow {
    pub user_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: String,
}

impl ReplayRow {
    pub fn to_fix(&self) -> AppResult<Fix> {
        let ts = DateTime::parse_from_rfc3339(self.timestamp.trim())
            .map_err(|_| AppError::InvalidTimestamp(self.timestamp.clone()))?
            .with_timezone(&Utc);
        Ok(Fix::new(self.latitude, self.longitude, ts))
    }
}

/// Read a replay file, keeping file order.
pub fn read_replay(path: &Path) -> AppResult<Vec<ReplayRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut rows = Vec::new();
    for rec in reader.deserialize() {
        rows.push(rec?);
    }
    Ok(rows)
}
