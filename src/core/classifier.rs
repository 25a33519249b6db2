//! Per-user movement classification.
//!
//! The classifier decides, for each incoming fix, whether the user moved,
//! stayed in place or whether nothing should be reported yet. It never
//! fails: a missing fix simply means nothing is emitted.

use crate::core::geo::distance_m;
use crate::models::event_code::EventCode;
use crate::models::position::{Fix, Position};
use crate::models::user_settings::UserSettings;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    FirstFix,
    Moving,
    Stationary,
}

impl Classification {
    /// First fixes are recorded as "same place".
    pub fn code(&self) -> EventCode {
        match self {
            Classification::FirstFix | Classification::Stationary => EventCode::Stationary,
            Classification::Moving => EventCode::Moving,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierPolicy {
    pub movement_threshold_m: f64,
    pub min_interval: Duration,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            movement_threshold_m: 100.0,
            min_interval: Duration::from_secs(60),
        }
    }
}

impl ClassifierPolicy {
    /// Apply per-user overrides. Non-positive values keep the current value.
    pub fn with_settings(mut self, settings: Option<UserSettings>) -> Self {
        if let Some(s) = settings {
            if s.wait_interval > 0 {
                self.min_interval = Duration::from_secs(s.wait_interval as u64);
            }
            if s.movement_threshold > 0 {
                self.movement_threshold_m = s.movement_threshold as f64;
            }
        }
        self
    }
}

/// State kept for one tracked user.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    /// Most recent fix seen, emitted or not.
    pub last_fix: Option<Fix>,
    /// Anchor fix distances are measured from. Only moves on first fix and movement.
    pub recorded_fix: Option<Fix>,
    pub last_emitted_at: Option<DateTime<Local>>,
    pub last_classification: Option<Classification>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classified {
    pub classification: Classification,
    pub position: Position,
}

#[derive(Debug, Clone)]
pub struct MovementClassifier {
    policy: ClassifierPolicy,
    state: TrackerState,
}

impl MovementClassifier {
    pub fn new(policy: ClassifierPolicy) -> Self {
        Self {
            policy,
            state: TrackerState::default(),
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn last_fix(&self) -> Option<Fix> {
        self.state.last_fix
    }

    /// Feed one fix observed at `now`.
    ///
    /// Movement is only reported when the distance threshold and the minimum
    /// interval are both satisfied; a large jump before the interval elapsed
    /// is rate-limited and produces nothing.
    pub fn observe(&mut self, fix: Fix, now: DateTime<Local>) -> Option<Classified> {
        self.state.last_fix = Some(fix);

        let Some(recorded) = self.state.recorded_fix else {
            self.state.recorded_fix = Some(fix);
            return Some(self.emit(Classification::FirstFix, fix.position, now));
        };

        if !self.interval_elapsed(now) {
            return None;
        }

        let distance = distance_m(&recorded.position, &fix.position);
        if distance > self.policy.movement_threshold_m {
            self.state.recorded_fix = Some(fix);
            Some(self.emit(Classification::Moving, fix.position, now))
        } else {
            Some(self.emit(Classification::Stationary, recorded.position, now))
        }
    }

    /// True when no emission happened yet or the minimum interval has passed.
    /// A clock that went backwards counts as "not elapsed".
    pub fn interval_elapsed(&self, now: DateTime<Local>) -> bool {
        match self.state.last_emitted_at {
            None => true,
            Some(last) => (now - last)
                .to_std()
                .map(|elapsed| elapsed >= self.policy.min_interval)
                .unwrap_or(false),
        }
    }

    /// Record an emission that did not come from `observe` (periodic checks).
    pub fn mark_emitted(&mut self, now: DateTime<Local>) {
        self.state.last_emitted_at = Some(match self.state.last_emitted_at {
            Some(last) if last > now => last,
            _ => now,
        });
    }

    fn emit(
        &mut self,
        classification: Classification,
        position: Position,
        now: DateTime<Local>,
    ) -> Classified {
        self.mark_emitted(now);
        self.state.last_classification = Some(classification);
        Classified {
            classification,
            position,
        }
    }
}
