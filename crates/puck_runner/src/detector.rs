//! Observation sources
//!
//! - `JsonLinesDetector`: replays detections recorded one JSON object per line
//! - `SimulatedDetector`: seeded synthetic puck for bench runs without a camera

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use puck_core::{Detector, DetectorError, Frame, ObjectClass, Observation, Table, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;

/// One recorded line: `{"t": 0.033, "objects": [{"x": 1, "y": 2, "r": 9, "class": "puck"}]}`
#[derive(Debug, Deserialize)]
struct RecordedFrame {
    #[serde(default)]
    t: Option<f64>,
    #[serde(default)]
    objects: Vec<RecordedObject>,
}

#[derive(Debug, Deserialize)]
struct RecordedObject {
    x: f32,
    y: f32,
    #[serde(default)]
    r: f32,
    #[serde(default)]
    class: ObjectClass,
}

impl From<RecordedObject> for Observation {
    fn from(o: RecordedObject) -> Self {
        Observation::new(Vec2::new(o.x, o.y), o.r, o.class)
    }
}

/// Frames from a JSON-lines stream
pub struct JsonLinesDetector<R: BufRead> {
    reader: R,
    line_no: usize,
    clock: Instant,
}

impl<R: BufRead> JsonLinesDetector<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_no: 0,
            clock: Instant::now(),
        }
    }

    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl JsonLinesDetector<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self, DetectorError> {
        let file = File::open(path)?;
        log::info!("Replaying detections from {:?}", path);
        Ok(Self::new(BufReader::new(file)))
    }
}

impl JsonLinesDetector<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> Detector for JsonLinesDetector<R> {
    fn next_frame(&mut self) -> Result<Option<Frame>, DetectorError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            if !line.trim().is_empty() {
                break;
            }
        }

        let recorded: RecordedFrame =
            serde_json::from_str(line.trim()).map_err(|e| DetectorError::Parse {
                line: self.line_no,
                message: e.to_string(),
            })?;

        let timestamp = recorded
            .t
            .unwrap_or_else(|| self.clock.elapsed().as_secs_f64());
        let observations = recorded.objects.into_iter().map(Observation::from).collect();
        Ok(Some(Frame::new(timestamp, observations)))
    }
}

/// Synthetic source settings
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub seed: u64,
    pub frame_rate: f64,
    /// Gaussian position noise (px, standard deviation)
    pub noise_px: f32,
    /// Probability that a frame has no detections
    pub drop_rate: f64,
    /// Initial speed range (px/frame)
    pub min_speed: f32,
    pub max_speed: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            frame_rate: 30.0,
            noise_px: 1.5,
            drop_rate: 0.05,
            min_speed: 6.0,
            max_speed: 14.0,
        }
    }
}

const PUCK_RADIUS: f32 = 18.0;
const PADDLE_RADIUS: f32 = 30.0;

/// A puck bouncing elastically around the table with the human's paddle
/// shadowing it near the bottom edge. Never runs dry.
pub struct SimulatedDetector {
    table: Table,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    noise: Normal<f32>,
    position: Vec2,
    velocity: Vec2,
    frame: u64,
}

impl SimulatedDetector {
    pub fn new(table: Table, config: SimulationConfig) -> Result<Self, DetectorError> {
        let noise = Normal::new(0.0, config.noise_px)
            .map_err(|e| DetectorError::Unavailable(format!("bad noise level: {}", e)))?;
        if !(config.frame_rate > 0.0) || !(0.0..=1.0).contains(&config.drop_rate) {
            return Err(DetectorError::Unavailable(
                "frame_rate must be positive and drop_rate in [0, 1]".to_string(),
            ));
        }
        if !(config.min_speed > 0.0 && config.min_speed < config.max_speed) {
            return Err(DetectorError::Unavailable("bad speed range".to_string()));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let speed = rng.gen_range(config.min_speed..config.max_speed);

        Ok(Self {
            position: Vec2::new(table.width * 0.5, table.height * 0.5),
            velocity: Vec2::new(angle.cos() * speed, angle.sin() * speed),
            table,
            config,
            rng,
            noise,
            frame: 0,
        })
    }

    /// True (noise-free) puck position
    pub fn puck_position(&self) -> Vec2 {
        self.position
    }

    fn advance(&mut self) {
        let mut p = self.position + self.velocity;
        let (w, h) = (self.table.width, self.table.height);
        if p.x < 0.0 || p.x > w {
            self.velocity.x = -self.velocity.x;
            p.x = if p.x < 0.0 { -p.x } else { 2.0 * w - p.x };
        }
        if p.y < 0.0 || p.y > h {
            self.velocity.y = -self.velocity.y;
            p.y = if p.y < 0.0 { -p.y } else { 2.0 * h - p.y };
        }
        self.position = self.table.clamp(p);
    }

    fn jitter(&mut self, p: Vec2) -> Vec2 {
        let dx = self.noise.sample(&mut self.rng);
        let dy = self.noise.sample(&mut self.rng);
        self.table.clamp(Vec2::new(p.x + dx, p.y + dy))
    }
}

impl Detector for SimulatedDetector {
    fn next_frame(&mut self) -> Result<Option<Frame>, DetectorError> {
        let timestamp = self.frame as f64 / self.config.frame_rate;
        self.frame += 1;
        self.advance();

        if self.rng.gen_bool(self.config.drop_rate) {
            return Ok(Some(Frame::empty(timestamp)));
        }

        let puck = self.jitter(self.position);
        let paddle_home = Vec2::new(self.position.x, self.table.height * 0.9);
        let paddle = self.jitter(paddle_home);

        Ok(Some(Frame::new(
            timestamp,
            vec![
                Observation::new(puck, PUCK_RADIUS, ObjectClass::Unknown),
                Observation::new(paddle, PADDLE_RADIUS, ObjectClass::Unknown),
            ],
        )))
    }
}
