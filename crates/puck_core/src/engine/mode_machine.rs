//! Paddle mode state machine
//!
//! Decides, once per frame, where the paddle should go and why.
//!
//! ```text
//!            trigger (tti / proximity)            window elapsed
//!   Predict ───────────────────────────▶ Hit ─────────────────────▶ Predict
//!      │
//!      │ puck dwells in robot half
//!      ▼
//!   AggressivePosition ──(position_duration)──▶ AggressiveStrike
//!                                                     │ (strike_delay)
//!                                                     ▼
//!   Predict ◀──(midline crossed | timeout)── AggressiveFollow
//! ```
//!
//! The aggressive sequence overrides the prediction output while active and
//! suppresses hit mode. A puck seen past the midline ends it from any phase.

use serde::{Deserialize, Serialize};

use super::constants::geometry::EPSILON;
use super::geometry::{Table, Vec2};
use super::position_filter::SmoothedState;
use super::trajectory::{PredictionResult, TrajectoryPredictor};
use crate::config::{AggressiveConfig, ControlConfig, HitConfig};

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Default: guard the target line at the predicted intercept
    #[default]
    Predict,
    /// Lunge forward at an imminent puck
    Hit,
    /// Line up behind a stalled puck
    AggressivePosition,
    /// Move to the puck-to-goal line, ready to strike
    AggressiveStrike,
    /// Drive through the puck toward the human goal
    AggressiveFollow,
}

impl Mode {
    pub fn is_aggressive(&self) -> bool {
        matches!(
            self,
            Mode::AggressivePosition | Mode::AggressiveStrike | Mode::AggressiveFollow
        )
    }

    /// Aggressive phase number (0 when not aggressive)
    pub fn phase(&self) -> u8 {
        match self {
            Mode::AggressivePosition => 1,
            Mode::AggressiveStrike => 2,
            Mode::AggressiveFollow => 3,
            Mode::Predict | Mode::Hit => 0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Predict => "PREDICT",
            Mode::Hit => "HIT",
            Mode::AggressivePosition => "AGGR_POSITION",
            Mode::AggressiveStrike => "AGGR_STRIKE",
            Mode::AggressiveFollow => "AGGR_FOLLOW",
        }
    }
}

/// Which vector fed the predictor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSource {
    /// Smoothed puck velocity
    Velocity,
    /// Paddle-to-puck vector (shot direction)
    ShotDirection,
}

/// Mode timers and flags, owned by the state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeContext {
    pub mode: Mode,
    /// Aggressive phase (0 = inactive, 1..=3)
    pub phase: u8,
    pub phase_start: f64,
    pub hit_start: Option<f64>,
    pub robot_half_entry: Option<f64>,
    /// Phase 2 set-up point on the puck-to-goal line
    pub setup_target: Option<Vec2>,
    pub last_strike_target: Option<Vec2>,
    pub midline_crossed: bool,
    /// y of the line currently defended (moves during follow-through)
    pub target_line_y: f32,
}

impl ModeContext {
    fn new(target_line_y: f32) -> Self {
        Self {
            mode: Mode::Predict,
            phase: 0,
            phase_start: 0.0,
            hit_start: None,
            robot_half_entry: None,
            setup_target: None,
            last_strike_target: None,
            midline_crossed: false,
            target_line_y,
        }
    }
}

/// Per-frame input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeInput {
    /// Frame time (s)
    pub now: f64,
    /// Latest smoothed puck estimate, possibly carried over from earlier frames
    pub puck: Option<SmoothedState>,
    /// Whether the puck was detected in this frame
    pub puck_visible: bool,
    /// Smoothed paddle position, only when detected in this frame
    pub paddle: Option<Vec2>,
}

/// Per-frame output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeDecision {
    pub mode: Mode,
    /// Commanded paddle position (table pixels); `None` = hold still
    pub target: Option<Vec2>,
    pub prediction: Option<PredictionResult>,
    pub source: Option<TargetSource>,
}

pub struct ModeStateMachine {
    table: Table,
    predictor: TrajectoryPredictor,
    velocity_threshold: f32,
    normal_line_y: f32,
    hit: HitConfig,
    aggressive: AggressiveConfig,
    ctx: ModeContext,
}

impl ModeStateMachine {
    pub fn new(config: &ControlConfig, table: Table) -> Self {
        let normal_line_y = table.height * config.prediction.target_line_fraction;
        Self {
            table,
            predictor: TrajectoryPredictor::new(config.prediction.frame_rate),
            velocity_threshold: config.prediction.velocity_threshold,
            normal_line_y,
            hit: config.hit.clone(),
            aggressive: config.aggressive.clone(),
            ctx: ModeContext::new(normal_line_y),
        }
    }

    pub fn context(&self) -> &ModeContext {
        &self.ctx
    }

    pub fn mode(&self) -> Mode {
        self.ctx.mode
    }

    /// y of the normal defended line
    pub fn normal_line_y(&self) -> f32 {
        self.normal_line_y
    }

    /// Advance one frame
    pub fn step(&mut self, input: &ModeInput) -> ModeDecision {
        let now = input.now;

        if self.aggressive.enabled && input.puck_visible {
            if let Some(puck) = input.puck {
                self.track_half(now, puck.position);
            }
        }

        if self.ctx.phase != 0 {
            self.ctx.hit_start = None;
            if let Some(decision) = self.advance_aggressive(now, input.puck) {
                return decision;
            }
        }

        let (prediction, source) = match (input.puck_visible, input.puck) {
            (true, Some(puck)) => self.primary_prediction(&puck, input.paddle),
            _ => (None, None),
        };

        if let (Some(p), Some(puck)) = (prediction, input.puck) {
            if self.hit_triggered(&p, puck.position) {
                if self.ctx.hit_start.is_none() {
                    log::debug!("Hit triggered at {:.3}s (tti {:?})", now, p.time_to_impact);
                }
                self.ctx.hit_start = Some(now);
            }
        }

        let in_window = self
            .ctx
            .hit_start
            .map_or(false, |start| now - start < self.hit.duration_s);
        let mode = if in_window {
            Mode::Hit
        } else {
            self.ctx.hit_start = None;
            Mode::Predict
        };
        self.set_mode(mode, now);

        let lunge = self.hit.lunge_fraction * self.table.height;
        let target = prediction.map(|p| match mode {
            Mode::Hit => Vec2::new(p.target.x, p.target.y + lunge),
            _ => p.target,
        });

        ModeDecision { mode, target, prediction, source }
    }

    /// Velocity prediction when the puck moves fast enough; otherwise the
    /// paddle-to-puck shot direction if a paddle is in view.
    fn primary_prediction(
        &self,
        puck: &SmoothedState,
        paddle: Option<Vec2>,
    ) -> (Option<PredictionResult>, Option<TargetSource>) {
        let line_y = self.ctx.target_line_y;

        if puck.speed() > self.velocity_threshold {
            let p = self.predictor.predict(puck.position, puck.velocity, &self.table, line_y);
            return (p, p.map(|_| TargetSource::Velocity));
        }

        let Some(paddle) = paddle else {
            return (None, None);
        };
        let shot = puck.position - paddle;
        if shot.length() < EPSILON {
            return (None, None);
        }
        // Shot vectors are not velocities: no time base for impact
        let p = self
            .predictor
            .predict(puck.position, shot, &self.table, line_y)
            .map(|p| PredictionResult { time_to_impact: None, ..p });
        (p, p.map(|_| TargetSource::ShotDirection))
    }

    fn hit_triggered(&self, prediction: &PredictionResult, puck: Vec2) -> bool {
        let imminent = prediction
            .time_to_impact
            .map_or(false, |t| t < self.hit.time_threshold_s);
        let close = (puck.y - self.ctx.target_line_y).abs()
            < self.hit.proximity_fraction * self.table.height;
        imminent || close
    }

    /// Dwell timer while idle; midline watch while attacking (any phase)
    fn track_half(&mut self, now: f64, puck: Vec2) {
        let midline = self.table.midline_y();

        if self.ctx.phase != 0 {
            if puck.y > midline && !self.ctx.midline_crossed {
                log::debug!("Puck crossed the midline at {:.3}s", now);
                self.ctx.midline_crossed = true;
            }
            return;
        }

        if puck.y < midline {
            let entry = *self.ctx.robot_half_entry.get_or_insert(now);
            if now - entry > self.aggressive.dwell_threshold_s {
                log::info!("Puck stalled in robot half for {:.2}s, attacking", now - entry);
                self.ctx.phase = 1;
                self.ctx.phase_start = now;
                self.ctx.hit_start = None;
                self.ctx.robot_half_entry = None;
                self.ctx.setup_target = None;
                self.ctx.last_strike_target = None;
                self.ctx.midline_crossed = false;
                self.set_mode(Mode::AggressivePosition, now);
            }
        } else {
            self.ctx.robot_half_entry = None;
        }
    }

    /// Run the active aggressive phase. `None` once the sequence has ended.
    fn advance_aggressive(&mut self, now: f64, puck: Option<SmoothedState>) -> Option<ModeDecision> {
        let elapsed = now - self.ctx.phase_start;
        let puck = puck.map(|p| p.position);

        let timed_out = self.ctx.phase == 3 && elapsed >= self.aggressive.follow_timeout_s;
        if self.ctx.midline_crossed || timed_out {
            log::info!(
                "Aggressive sequence finished in phase {} ({})",
                self.ctx.phase,
                if self.ctx.midline_crossed { "puck returned" } else { "timeout" }
            );
            self.clear_aggressive();
            return None;
        }

        match self.ctx.phase {
            1 if elapsed >= self.aggressive.position_duration_s => {
                let setup = puck.map(|p| self.setup_point(p));
                self.ctx.setup_target = setup;
                self.enter_phase(2, Mode::AggressiveStrike, now);
            }
            2 if elapsed >= self.aggressive.strike_delay_s => {
                let strike = puck.map(|p| self.strike_point(p));
                if let Some(s) = strike {
                    self.ctx.target_line_y = s.y;
                }
                self.ctx.last_strike_target = strike;
                self.enter_phase(3, Mode::AggressiveFollow, now);
            }
            _ => {}
        }

        let target = match self.ctx.phase {
            1 => puck.map(|p| self.table.clamp(Vec2::new(p.x, self.normal_line_y))),
            2 => self.ctx.setup_target,
            _ => self.ctx.last_strike_target,
        };

        Some(ModeDecision {
            mode: self.ctx.mode,
            target,
            prediction: None,
            source: None,
        })
    }

    fn enter_phase(&mut self, phase: u8, mode: Mode, now: f64) {
        self.ctx.phase = phase;
        self.ctx.phase_start = now;
        self.set_mode(mode, now);
    }

    fn clear_aggressive(&mut self) {
        self.ctx.phase = 0;
        self.ctx.phase_start = 0.0;
        self.ctx.setup_target = None;
        self.ctx.last_strike_target = None;
        self.ctx.midline_crossed = false;
        self.ctx.robot_half_entry = None;
        self.ctx.target_line_y = self.normal_line_y;
    }

    /// Unit vector from the puck toward the human goal
    fn goal_direction(&self, puck: Vec2) -> Vec2 {
        (self.table.human_goal() - puck)
            .normalized()
            .unwrap_or(Vec2::new(0.0, 1.0))
    }

    /// Where the puck-to-goal line meets the normal defended line
    fn setup_point(&self, puck: Vec2) -> Vec2 {
        let dir = self.goal_direction(puck);
        if dir.y.abs() < EPSILON {
            return self.table.clamp(Vec2::new(puck.x, self.normal_line_y));
        }
        let s = (self.normal_line_y - puck.y) / dir.y;
        self.table.clamp(puck + dir * s)
    }

    /// Aim point past the puck along the puck-to-goal line
    fn strike_point(&self, puck: Vec2) -> Vec2 {
        let dir = self.goal_direction(puck);
        let reach = self.aggressive.strike_overshoot_fraction * self.table.height;
        self.table.clamp(puck + dir * reach)
    }

    fn set_mode(&mut self, mode: Mode, now: f64) {
        if self.ctx.mode != mode {
            log::info!("Mode {} -> {} at {:.3}s", self.ctx.mode.name(), mode.name(), now);
            self.ctx.mode = mode;
        }
    }
}
