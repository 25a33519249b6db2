use super::{event_code::EventCode, location_event::LocationEvent, position::Position};
use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

/// A pending event stored in the outbox.
///
/// Rows are append/delete only: a record is never updated in place.
#[derive(Debug, Clone, Serialize)]
pub struct OutboxRecord {
    pub id: i64,                    // ⇔ outbox.id (AUTOINCREMENT)
    pub uid: Uuid,                  // ⇔ outbox.event_uid
    pub user_id: i64,               // ⇔ outbox.user_id
    pub position: Position,         // ⇔ outbox.coordinates ("lat,lon")
    pub captured_at: DateTime<Local>, // ⇔ outbox.captured_at (RFC 3339)
    pub note: String,               // ⇔ outbox.note
    pub code: EventCode,            // ⇔ outbox.code
}

impl OutboxRecord {
    /// Rebuild the event the record was created from.
    pub fn to_event(&self) -> LocationEvent {
        LocationEvent {
            uid: self.uid,
            user_id: self.user_id,
            position: self.position,
            note: self.note.clone(),
            code: self.code,
            timestamp: self.captured_at,
        }
    }
}
