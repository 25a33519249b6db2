//! Unified application error type.
//! All modules (db, core, cli, remote) return AppError to keep the error
//! handling consistent and easy to manage.

use crate::remote::SinkError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Invalid event code: {0}")]
    InvalidEventCode(i64),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid replay file: {0}")]
    Replay(#[from] csv::Error),

    // ---------------------------
    // Tracking errors
    // ---------------------------
    #[error("Remote store error: {0}")]
    Sink(#[from] SinkError),

    #[error("Tracker for user {0} is no longer running")]
    TrackerClosed(i64),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("No user given and no default_user_id configured")]
    MissingUser,

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

pub type AppResult<T> = Result<T, AppError>;
