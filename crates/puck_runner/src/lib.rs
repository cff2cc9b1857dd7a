//! Air hockey runner library
//!
//! Hardware-facing collaborators for `puck_core`: serial transport,
//! detection sources and table calibration loading.

pub mod calibration;
pub mod config;
pub mod detector;
pub mod serial;

pub use calibration::{load_calibration, load_table, Calibration};
pub use config::{LinkConfig, RunnerConfig};
pub use detector::{JsonLinesDetector, SimulatedDetector, SimulationConfig};
pub use serial::{run_loopback, LoopbackResult, SerialLink, WriterSink};
