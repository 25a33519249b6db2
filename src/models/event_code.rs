use serde::Serialize;

/// Semantic cause of a location record. The numeric value is what the
/// remote table and the outbox store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventCode {
    Stationary,     // 1
    Moving,         // 2
    DeviceStopping, // 3
    Boot,           // 4
    NoGps,          // 5
    NoNetwork,      // 6
}

impl EventCode {
    pub fn code(&self) -> i64 {
        match self {
            EventCode::Stationary => 1,
            EventCode::Moving => 2,
            EventCode::DeviceStopping => 3,
            EventCode::Boot => 4,
            EventCode::NoGps => 5,
            EventCode::NoNetwork => 6,
        }
    }

    /// Convert DB integer → enum
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(EventCode::Stationary),
            2 => Some(EventCode::Moving),
            3 => Some(EventCode::DeviceStopping),
            4 => Some(EventCode::Boot),
            5 => Some(EventCode::NoGps),
            6 => Some(EventCode::NoNetwork),
            _ => None,
        }
    }

    /// Human-readable note stored next to the code. Descriptive only.
    pub fn default_note(&self) -> &'static str {
        match self {
            EventCode::Stationary => "user at same place",
            EventCode::Moving => "user moving",
            EventCode::DeviceStopping => "device stopping or restarting",
            EventCode::Boot => "device started",
            EventCode::NoGps => "positioning disabled",
            EventCode::NoNetwork => "no network",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventCode::Stationary => "stationary",
            EventCode::Moving => "moving",
            EventCode::DeviceStopping => "stopping",
            EventCode::Boot => "boot",
            EventCode::NoGps => "no-gps",
            EventCode::NoNetwork => "no-network",
        }
    }
}
