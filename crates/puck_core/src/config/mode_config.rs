//! Hit mode and aggressive sequence settings
//!
//! Distances are fractions of table height so one config serves any
//! calibrated table size.

use serde::{Deserialize, Serialize};

use crate::engine::constants::{aggressive, hit};

/// Hit (lunge) mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HitConfig {
    /// Time to impact (s) below which the lunge triggers
    pub time_threshold_s: f32,
    /// Puck-to-target-line distance (fraction of height) that triggers the lunge
    pub proximity_fraction: f32,
    /// Hold time (s) measured from the most recent trigger
    pub duration_s: f64,
    /// Forward bias of the commanded y (fraction of height)
    pub lunge_fraction: f32,
}

impl Default for HitConfig {
    fn default() -> Self {
        Self {
            time_threshold_s: hit::TIME_THRESHOLD_S,
            proximity_fraction: hit::PROXIMITY_FRACTION,
            duration_s: hit::DURATION_S,
            lunge_fraction: hit::LUNGE_FRACTION,
        }
    }
}

/// Aggressive (stalled puck) sequence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggressiveConfig {
    /// Master switch for the whole sequence
    pub enabled: bool,
    /// Continuous dwell (s) in the robot half before attacking
    pub dwell_threshold_s: f64,
    /// Phase 1 duration (s)
    pub position_duration_s: f64,
    /// Phase 2 duration (s)
    pub strike_delay_s: f64,
    /// Strike aim point past the puck (fraction of height)
    pub strike_overshoot_fraction: f32,
    /// Phase 3 timeout (s)
    pub follow_timeout_s: f64,
}

impl Default for AggressiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dwell_threshold_s: aggressive::DWELL_THRESHOLD_S,
            position_duration_s: aggressive::POSITION_DURATION_S,
            strike_delay_s: aggressive::STRIKE_DELAY_S,
            strike_overshoot_fraction: aggressive::STRIKE_OVERSHOOT_FRACTION,
            follow_timeout_s: aggressive::FOLLOW_TIMEOUT_S,
        }
    }
}
