//! # Control Configuration
//!
//! Every tuning constant of the control loop lives here instead of being
//! scattered through the engine.
//!
//! ## Presets
//!
//! | Preset | Behavior |
//! |--------|----------|
//! | `standard` | Reference values (default) |
//! | `defensive` | No aggressive sequence, longer lunge window |
//! | `attacking` | Earlier lunges, attacks a stalled puck sooner |
//!
//! ## Usage
//!
//! ```rust
//! use puck_core::config::ControlConfig;
//!
//! let config = ControlConfig::default();
//! let defensive = ControlConfig::defensive();
//! assert!(!defensive.aggressive.enabled);
//! assert!(config.validate().is_ok());
//! ```
//!
//! ## Environment Variables
//!
//! - `PUCK_PROFILE`: Select preset (standard, defensive, attacking)

mod mode_config;
mod scale_config;
mod tracking_config;

pub use mode_config::{AggressiveConfig, HitConfig};
pub use scale_config::ControllerScale;
pub use tracking_config::{FilterConfig, PredictionConfig};

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::engine::constants::controller::FIELD_MAX;
use crate::error::{CoreError, Result};

/// Full control loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ControlConfig {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
    #[serde(default)]
    pub hit: HitConfig,
    #[serde(default)]
    pub aggressive: AggressiveConfig,
    #[serde(default)]
    pub controller: ControllerScale,
}

impl ControlConfig {
    /// Reference tuning
    pub fn standard() -> Self {
        Self::default()
    }

    /// Pure goalkeeping: never leaves the defended line to attack
    pub fn defensive() -> Self {
        let mut cfg = Self::default();
        cfg.aggressive.enabled = false;
        cfg.hit.duration_s = 1.5;
        cfg
    }

    /// Lunges earlier and attacks a stalled puck sooner
    pub fn attacking() -> Self {
        let mut cfg = Self::default();
        cfg.hit.time_threshold_s = 0.6;
        cfg.hit.lunge_fraction = 0.08;
        cfg.aggressive.dwell_threshold_s = 0.6;
        cfg.aggressive.position_duration_s = 0.6;
        cfg
    }

    /// Preset by name; unknown names fall back to `standard`
    pub fn profile(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "defensive" => Self::defensive(),
            "attacking" => Self::attacking(),
            _ => Self::standard(),
        }
    }

    /// Load from environment variable PUCK_PROFILE or use default
    pub fn from_env_or_default() -> Self {
        Self::profile(&env::var("PUCK_PROFILE").unwrap_or_default())
    }

    /// Load a JSON config file; absent sections keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        log::debug!("Loaded control config from {:?}", path);
        Ok(cfg)
    }

    /// Reject values the control loop cannot run with
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(CoreError::InvalidConfig(msg));

        let alpha = self.filter.alpha;
        if !(alpha > 0.0 && alpha < 1.0) {
            return invalid(format!("filter.alpha must be in (0, 1), got {}", alpha));
        }

        let p = &self.prediction;
        if !(p.frame_rate.is_finite() && p.frame_rate > 0.0) {
            return invalid(format!("prediction.frame_rate must be positive, got {}", p.frame_rate));
        }
        if !(p.velocity_threshold >= 0.0) {
            return invalid(format!(
                "prediction.velocity_threshold must be non-negative, got {}",
                p.velocity_threshold
            ));
        }
        if !(p.target_line_fraction > 0.0 && p.target_line_fraction < 0.5) {
            return invalid(format!(
                "prediction.target_line_fraction must be in (0, 0.5), got {}",
                p.target_line_fraction
            ));
        }

        let h = &self.hit;
        if !(h.time_threshold_s >= 0.0 && h.proximity_fraction >= 0.0 && h.lunge_fraction >= 0.0) {
            return invalid("hit thresholds must be non-negative".to_string());
        }
        if !(h.duration_s > 0.0) {
            return invalid(format!("hit.duration_s must be positive, got {}", h.duration_s));
        }

        let a = &self.aggressive;
        let durations = [
            ("dwell_threshold_s", a.dwell_threshold_s),
            ("position_duration_s", a.position_duration_s),
            ("strike_delay_s", a.strike_delay_s),
            ("follow_timeout_s", a.follow_timeout_s),
        ];
        for (name, value) in durations {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!("aggressive.{} must be non-negative, got {}", name, value));
            }
        }

        let c = &self.controller;
        if c.x_min >= c.x_max || c.y_min >= c.y_max {
            return invalid(format!(
                "controller range is empty: x {}..{}, y {}..{}",
                c.x_min, c.x_max, c.y_min, c.y_max
            ));
        }
        if c.x_max > FIELD_MAX || c.y_max > FIELD_MAX {
            return invalid(format!(
                "controller range exceeds the 4-digit wire field ({})",
                FIELD_MAX
            ));
        }

        Ok(())
    }
}

// ========== Tests ==========
