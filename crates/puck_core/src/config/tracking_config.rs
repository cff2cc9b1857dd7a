//! Smoothing and prediction settings

use serde::{Deserialize, Serialize};

use crate::engine::constants::tracking;

/// Position filter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Weight of the newest raw sample, in (0, 1)
    pub alpha: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { alpha: tracking::SMOOTHING_ALPHA }
    }
}

/// Trajectory prediction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Assumed camera frame rate (frames/s)
    pub frame_rate: f32,
    /// Minimum puck speed (px/frame) for velocity-based prediction
    pub velocity_threshold: f32,
    /// Defended line as a fraction of table height from the robot edge
    pub target_line_fraction: f32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            frame_rate: tracking::FRAME_RATE,
            velocity_threshold: tracking::VELOCITY_THRESHOLD,
            target_line_fraction: tracking::TARGET_LINE_FRACTION,
        }
    }
}
