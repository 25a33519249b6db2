//! In-process remote store. Used by tests and dry runs.

use super::{RemoteSink, SinkError, UserSettingsSource};
use crate::models::event_code::EventCode;
use crate::models::location_event::LocationEvent;
use crate::models::position::Position;
use crate::models::user_settings::UserSettings;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use uuid::Uuid;

pub struct MemorySink {
    rows: Mutex<Vec<LocationEvent>>,
    accepting: AtomicBool,
    rejected: Mutex<HashSet<Uuid>>,
    write_attempts: AtomicUsize,
    settings: Mutex<HashMap<i64, UserSettings>>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            accepting: AtomicBool::new(true),
            rejected: Mutex::new(HashSet::new()),
            write_attempts: AtomicUsize::new(0),
            settings: Mutex::new(HashMap::new()),
        }
    }

    /// When false every write fails as unreachable.
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    /// Reject writes for one event until `accept` is called for it.
    pub fn reject(&self, uid: Uuid) {
        self.rejected.lock().insert(uid);
    }

    pub fn accept(&self, uid: Uuid) {
        self.rejected.lock().remove(&uid);
    }

    pub fn set_user_settings(&self, user_id: i64, settings: UserSettings) {
        self.settings.lock().insert(user_id, settings);
    }

    /// Rows confirmed so far, in write order.
    pub fn rows(&self) -> Vec<LocationEvent> {
        self.rows.lock().clone()
    }

    /// Number of `write` calls, successful or not.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSink for MemorySink {
    async fn write(&self, event: &LocationEvent) -> Result<(), SinkError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);

        if !self.accepting.load(Ordering::SeqCst) {
            return Err(SinkError::Unreachable("memory sink offline".into()));
        }
        if self.rejected.lock().contains(&event.uid) {
            return Err(SinkError::Rejected(format!("event {} refused", event.uid)));
        }

        let mut rows = self.rows.lock();
        if !rows.iter().any(|r| r.uid == event.uid) {
            rows.push(event.clone());
        }
        Ok(())
    }

    async fn last_coordinates(&self, user_id: i64) -> Result<Option<Position>, SinkError> {
        Ok(self
            .rows
            .lock()
            .iter()
            .rev()
            .find(|r| r.user_id == user_id && r.code != EventCode::Boot)
            .map(|r| r.position))
    }
}

#[async_trait]
impl UserSettingsSource for MemorySink {
    async fn user_settings(&self, user_id: i64) -> Result<Option<UserSettings>, SinkError> {
        Ok(self.settings.lock().get(&user_id).copied())
    }
}
