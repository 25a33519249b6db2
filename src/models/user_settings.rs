use serde::{Deserialize, Serialize};

/// Per-user tunables held by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Minimum seconds between two emissions.
    pub wait_interval: i64,
    /// Distance in metres a fix must move to count as movement.
    pub movement_threshold: i64,
}
