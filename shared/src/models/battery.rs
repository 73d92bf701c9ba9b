//! Battery state-of-health models

use serde::{Deserialize, Serialize};

/// Default state of health for a new certificate
pub const DEFAULT_STATE_OF_HEALTH: u8 = 90;

/// Lower bound (inclusive) of the "Excellent" band
pub const EXCELLENT_THRESHOLD: u8 = 85;

/// Lower bound (inclusive) of the "Good" band
pub const GOOD_THRESHOLD: u8 = 65;

/// Battery condition shown next to the state of health
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatteryStatus {
    Excellent,
    Good,
    Bad,
}

impl BatteryStatus {
    /// Classify a state-of-health percentage
    pub fn from_state_of_health(percent: u8) -> Self {
        if percent >= EXCELLENT_THRESHOLD {
            BatteryStatus::Excellent
        } else if percent >= GOOD_THRESHOLD {
            BatteryStatus::Good
        } else {
            BatteryStatus::Bad
        }
    }
}

impl std::fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatteryStatus::Excellent => write!(f, "Excellent"),
            BatteryStatus::Good => write!(f, "Good"),
            BatteryStatus::Bad => write!(f, "Bad"),
        }
    }
}

/// Clamp an arbitrary percentage into 0..=100
pub fn clamp_state_of_health(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}
