//! Motion controller coordinate range

use serde::{Deserialize, Serialize};

use crate::engine::constants::controller;

/// Native coordinate range of the motion controller
///
/// Table fractions map linearly onto `[min, max]` per axis. `flip_*`
/// mirrors an axis when the gantry's origin sits at the opposite corner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerScale {
    pub x_min: u16,
    pub x_max: u16,
    pub y_min: u16,
    pub y_max: u16,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Default for ControllerScale {
    fn default() -> Self {
        Self {
            x_min: controller::X_MIN,
            x_max: controller::X_MAX,
            y_min: controller::Y_MIN,
            y_max: controller::Y_MAX,
            flip_x: false,
            flip_y: false,
        }
    }
}
