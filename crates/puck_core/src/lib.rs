//! # puck_core - Air Hockey Defense Controller
//!
//! Turns per-frame puck/paddle detections into absolute move commands for a
//! two-axis paddle gantry.
//!
//! ## Pipeline
//! - `PositionFilter`: exponential smoothing, velocity in px/frame
//! - `TrajectoryPredictor`: ray onto the defended line with one wall bounce
//! - `ModeStateMachine`: predict / hit / aggressive attack sequence
//! - `CommandEncoder`: table pixels → `M` + 4 + 4 digit ASCII frame
//!
//! Table coordinates have their origin at the top-left; the robot defends
//! the top edge (y = 0) and the human goal sits at the bottom.
//!
//! ## Usage
//!
//! ```rust
//! use puck_core::{ControlConfig, Controller, Frame, Observation, Table};
//!
//! let table = Table::new(640.0, 480.0).unwrap();
//! let mut controller = Controller::new(ControlConfig::default(), table).unwrap();
//! let outcome = controller.process(&Frame::new(0.0, vec![Observation::puck(320.0, 400.0)]));
//! assert!(outcome.command.is_none()); // no velocity after a single sample
//! ```

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]

pub mod config;
pub mod engine;
pub mod error;
pub mod protocol;

pub use config::{AggressiveConfig, ControlConfig, ControllerScale, FilterConfig, HitConfig, PredictionConfig};
pub use engine::{
    run_session, CommandSink, Controller, Detector, Frame, FrameOutcome, Mode, Observation,
    ObjectClass, PredictionResult, SessionStats, SmoothedState, Table, Vec2,
};
pub use error::{CommandError, CoreError, DetectorError, Result, TransportError};
pub use protocol::{CommandEncoder, MoveCommand};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
