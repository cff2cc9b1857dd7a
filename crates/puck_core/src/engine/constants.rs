//! Control constants
//!
//! Reference values for the tunables in `ControlConfig`. Fractions are of
//! table height unless stated otherwise.

// ============================================================
// Geometry guards
// ============================================================
pub mod geometry {
    /// Near-zero guard for velocity components and ray parameters
    pub const EPSILON: f32 = 1e-3;
}

// ============================================================
// Smoothing / prediction
// ============================================================
pub mod tracking {
    /// Exponential smoothing factor (weight of the newest sample)
    pub const SMOOTHING_ALPHA: f32 = 0.3;

    /// Assumed camera frame rate, converts frames to seconds
    pub const FRAME_RATE: f32 = 30.0;

    /// Puck speed (px/frame) below which no velocity prediction is attempted
    pub const VELOCITY_THRESHOLD: f32 = 1.5;

    /// Defended line, measured from the robot's edge
    pub const TARGET_LINE_FRACTION: f32 = 0.20;
}

// ============================================================
// Hit mode
// ============================================================
pub mod hit {
    /// Time to impact (s) that triggers a lunge
    pub const TIME_THRESHOLD_S: f32 = 0.4;

    /// Puck-to-line distance that triggers a lunge
    pub const PROXIMITY_FRACTION: f32 = 0.15;

    /// Hold time (s) after the latest trigger
    pub const DURATION_S: f64 = 1.0;

    /// Forward bias of the commanded y while lunging
    pub const LUNGE_FRACTION: f32 = 0.05;
}

// ============================================================
// Aggressive sequence
// ============================================================
pub mod aggressive {
    /// Continuous puck dwell (s) in the robot half before attacking
    pub const DWELL_THRESHOLD_S: f64 = 1.0;

    /// Phase 1 (position) duration (s)
    pub const POSITION_DURATION_S: f64 = 1.0;

    /// Phase 2 (strike wind-up) duration (s)
    pub const STRIKE_DELAY_S: f64 = 0.2;

    /// How far past the puck the strike aims
    pub const STRIKE_OVERSHOOT_FRACTION: f32 = 0.10;

    /// Phase 3 (follow-through) timeout (s)
    pub const FOLLOW_TIMEOUT_S: f64 = 10.0;
}

// ============================================================
// Motion controller coordinate range
// ============================================================
pub mod controller {
    pub const X_MIN: u16 = 0;
    pub const X_MAX: u16 = 2857;
    pub const Y_MIN: u16 = 0;
    pub const Y_MAX: u16 = 4873;

    /// Largest value that fits the 4-digit wire field
    pub const FIELD_MAX: u16 = 9999;
}
