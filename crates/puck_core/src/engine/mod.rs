pub mod constants;
pub mod controller; // Per-frame pipeline (filters → mode machine → encoder)
pub mod geometry;
pub mod mode_machine;
pub mod observation;
pub mod position_filter;
pub mod session; // Detector/CommandSink seams + control loop
pub mod trajectory;

pub use controller::{Controller, FrameOutcome};
pub use geometry::{Table, Vec2};
pub use mode_machine::{Mode, ModeContext, ModeDecision, ModeInput, ModeStateMachine, TargetSource};
pub use observation::{Frame, FrameObservations, ObjectClass, Observation};
pub use position_filter::{PositionFilter, SmoothedState};
pub use session::{run_session, CommandSink, Detector, SessionStats};
pub use trajectory::{
    first_wall_crossing, time_to_line, BounceResult, PredictionResult, TrajectoryPredictor, Wall,
};
