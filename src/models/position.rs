use crate::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Placeholder used for events with no physical position (boot).
    pub fn origin() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Convert → remote/outbox string "lat,lon"
    pub fn coordinates(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }

    /// Convert "lat,lon" → Position
    pub fn from_coordinates(s: &str) -> AppResult<Self> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| AppError::InvalidCoordinates(s.to_string()))?;

        let latitude: f64 = lat
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidCoordinates(s.to_string()))?;
        let longitude: f64 = lon
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidCoordinates(s.to_string()))?;

        Self::checked(latitude, longitude)
    }

    /// Build a position, rejecting values outside the WGS84 ranges.
    pub fn checked(latitude: f64, longitude: f64) -> AppResult<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::InvalidCoordinates(format!("{latitude},{longitude}")));
        }
        Ok(Self::new(latitude, longitude))
    }
}

/// One position sample delivered by the positioning source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub position: Position,
    pub timestamp: DateTime<Utc>,
}

impl Fix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            position: Position::new(latitude, longitude),
            timestamp,
        }
    }
}
