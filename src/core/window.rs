//! Time-of-day gate deciding whether an event may be persisted.

use chrono::{NaiveTime, Timelike};
use serde::Serialize;

/// Hours of the day during which tracking is persisted.
///
/// `start_hour` is inclusive from its first minute. `end_hour` is excluded
/// unless `include_end_hour` is set. A window with `start_hour > end_hour`
/// wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActiveWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    pub include_end_hour: bool,
}

impl Default for ActiveWindow {
    fn default() -> Self {
        Self::new(8, 18, false)
    }
}

impl ActiveWindow {
    pub fn new(start_hour: u32, end_hour: u32, include_end_hour: bool) -> Self {
        Self {
            start_hour,
            end_hour,
            include_end_hour,
        }
    }

    /// Window that never gates anything.
    pub fn always() -> Self {
        Self::new(0, 23, true)
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.contains_hour(time.hour())
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        let at_end = self.include_end_hour && hour == self.end_hour;

        if self.start_hour <= self.end_hour {
            (hour >= self.start_hour && hour < self.end_hour) || at_end
        } else {
            hour >= self.start_hour || hour < self.end_hour || at_end
        }
    }
}
