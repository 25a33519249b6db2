use super::{event_code::EventCode, position::Position};
use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

/// An event emitted by a tracker, before the routing decision.
#[derive(Debug, Clone, Serialize)]
pub struct LocationEvent {
    pub uid: Uuid,
    pub user_id: i64,
    pub position: Position,
    pub note: String,
    pub code: EventCode,
    pub timestamp: DateTime<Local>,
}

impl LocationEvent {
    /// Build an event with the code's default note and a fresh uid.
    pub fn new(user_id: i64, position: Position, code: EventCode, timestamp: DateTime<Local>) -> Self {
        Self {
            uid: Uuid::now_v7(),
            user_id,
            position,
            note: code.default_note().to_string(),
            code,
            timestamp,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}
