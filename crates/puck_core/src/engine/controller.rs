//! Per-frame control pipeline
//!
//! Frame → role assignment → filters → mode state machine → encoder.

use serde::Serialize;

use super::geometry::{Table, Vec2};
use super::mode_machine::{Mode, ModeContext, ModeInput, ModeStateMachine, TargetSource};
use super::observation::{Frame, FrameObservations};
use super::position_filter::{PositionFilter, SmoothedState};
use super::trajectory::PredictionResult;
use crate::config::ControlConfig;
use crate::error::Result;
use crate::protocol::{CommandEncoder, MoveCommand};

/// What the controller decided for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameOutcome {
    pub timestamp: f64,
    pub mode: Mode,
    pub puck_visible: bool,
    pub target: Option<Vec2>,
    pub command: Option<MoveCommand>,
    pub prediction: Option<PredictionResult>,
    pub source: Option<TargetSource>,
}

/// Owns all per-session state of the control loop
pub struct Controller {
    table: Table,
    puck_filter: PositionFilter,
    paddle_filter: PositionFilter,
    machine: ModeStateMachine,
    encoder: CommandEncoder,
}

impl Controller {
    pub fn new(config: ControlConfig, table: Table) -> Result<Self> {
        config.validate()?;
        table.validate()?;
        log::info!(
            "Controller ready: table {}x{}, line y={:.1}, aggressive={}",
            table.width,
            table.height,
            table.height * config.prediction.target_line_fraction,
            config.aggressive.enabled
        );

        Ok(Self {
            puck_filter: PositionFilter::new(config.filter.alpha),
            paddle_filter: PositionFilter::new(config.filter.alpha),
            machine: ModeStateMachine::new(&config, table),
            encoder: CommandEncoder::new(config.controller.clone()),
            table,
        })
    }

    pub fn process(&mut self, frame: &Frame) -> FrameOutcome {
        let roles = FrameObservations::assign_roles(&frame.observations);

        let puck_visible = roles.puck.is_some();
        if let Some(obs) = roles.puck {
            self.puck_filter.update(obs.position);
        }
        let paddle = roles.paddle.map(|obs| self.paddle_filter.update(obs.position).position);
        let puck = self.puck_filter.is_initialized().then(|| self.puck_filter.state());

        let decision = self.machine.step(&ModeInput {
            now: frame.timestamp,
            puck,
            puck_visible,
            paddle,
        });

        let command = decision.target.map(|t| self.encoder.encode(t, &self.table));

        FrameOutcome {
            timestamp: frame.timestamp,
            mode: decision.mode,
            puck_visible,
            target: decision.target,
            command,
            prediction: decision.prediction,
            source: decision.source,
        }
    }

    pub fn puck_state(&self) -> SmoothedState {
        self.puck_filter.state()
    }

    pub fn paddle_state(&self) -> SmoothedState {
        self.paddle_filter.state()
    }

    pub fn mode_context(&self) -> &ModeContext {
        self.machine.context()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn encoder(&self) -> &CommandEncoder {
        &self.encoder
    }
}
