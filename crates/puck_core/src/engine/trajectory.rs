//! Trajectory Prediction
//!
//! Projects a ray from the puck onto the defended line, following at most
//! one elastic reflection off a table wall.
//!
//! Ray parameters `t` are in the direction vector's units: frames when the
//! direction is a velocity in px/frame. `time_to_impact` divides by the
//! configured frame rate.

use serde::{Deserialize, Serialize};

use super::constants::geometry::EPSILON;
use super::geometry::{Table, Vec2};

/// Table boundary walls, in tie-break order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Wall {
    Left,
    Right,
    Top,
    Bottom,
}

impl Wall {
    /// Mirror a direction vector off this wall
    pub fn reflect(self, direction: Vec2) -> Vec2 {
        match self {
            Wall::Left | Wall::Right => Vec2::new(-direction.x, direction.y),
            Wall::Top | Wall::Bottom => Vec2::new(direction.x, -direction.y),
        }
    }
}

/// Earliest wall crossing of a ray
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BounceResult {
    /// Ray parameter at the wall (> EPSILON)
    pub t: f32,
    /// Crossing point, on the table boundary
    pub point: Vec2,
    pub wall: Wall,
}

/// Intercept of a ray with the defended line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub target: Vec2,
    /// Seconds until the puck reaches `target`
    pub time_to_impact: Option<f32>,
    pub bounced: bool,
    pub bounce_point: Option<Vec2>,
    pub wall: Option<Wall>,
}

/// Ray parameter at which `origin + t·direction` reaches `y = target_y`
///
/// `None` when the ray runs parallel to the line (`|vy| < EPSILON`).
pub fn time_to_line(origin: Vec2, direction: Vec2, target_y: f32) -> Option<f32> {
    if direction.y.abs() < EPSILON {
        return None;
    }
    Some((target_y - origin.y) / direction.y)
}

/// First wall the ray crosses at a positive parameter.
///
/// A wall is a candidate only when the direction component toward it is
/// larger than `EPSILON` in magnitude, so a near-parallel drift never
/// produces a far-off crossing. A crossing counts only if the other
/// coordinate is inside the table at that moment. Equal `t` resolves in
/// Left, Right, Top, Bottom order.
pub fn first_wall_crossing(origin: Vec2, direction: Vec2, table: &Table) -> Option<BounceResult> {
    let (w, h) = (table.width, table.height);
    let mut best: Option<BounceResult> = None;

    let mut consider = |t: f32, point: Vec2, wall: Wall| {
        if t <= EPSILON {
            return;
        }
        if best.map_or(true, |b| t < b.t) {
            best = Some(BounceResult { t, point, wall });
        }
    };

    if direction.x < -EPSILON {
        let t = (0.0 - origin.x) / direction.x;
        let y = origin.y + t * direction.y;
        if (0.0..=h).contains(&y) {
            consider(t, Vec2::new(0.0, y), Wall::Left);
        }
    }
    if direction.x > EPSILON {
        let t = (w - origin.x) / direction.x;
        let y = origin.y + t * direction.y;
        if (0.0..=h).contains(&y) {
            consider(t, Vec2::new(w, y), Wall::Right);
        }
    }
    if direction.y < -EPSILON {
        let t = (0.0 - origin.y) / direction.y;
        let x = origin.x + t * direction.x;
        if (0.0..=w).contains(&x) {
            consider(t, Vec2::new(x, 0.0), Wall::Top);
        }
    }
    if direction.y > EPSILON {
        let t = (h - origin.y) / direction.y;
        let x = origin.x + t * direction.x;
        if (0.0..=w).contains(&x) {
            consider(t, Vec2::new(x, h), Wall::Bottom);
        }
    }

    best
}

/// Intercept predictor for one defended line
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryPredictor {
    frame_rate: f32,
}

impl TrajectoryPredictor {
    pub fn new(frame_rate: f32) -> Self {
        Self { frame_rate }
    }

    /// Where the ray meets `y = target_y`, directly or after one bounce.
    ///
    /// The bounce path is taken when the first wall comes strictly before
    /// the line, or when the line cannot be reached directly (parallel ray
    /// or line behind the origin). Returns `None` when neither path reaches
    /// the line.
    pub fn predict(
        &self,
        origin: Vec2,
        direction: Vec2,
        table: &Table,
        target_y: f32,
    ) -> Option<PredictionResult> {
        let t_direct = time_to_line(origin, direction, target_y).filter(|t| *t > 0.0);
        let bounce = first_wall_crossing(origin, direction, table);

        let use_bounce = match (bounce, t_direct) {
            (Some(b), Some(t)) => b.t < t,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if !use_bounce {
            let t = t_direct?;
            return Some(PredictionResult {
                target: origin + direction * t,
                time_to_impact: Some(t / self.frame_rate),
                bounced: false,
                bounce_point: None,
                wall: None,
            });
        }

        let bounce = bounce?;
        let reflected = bounce.wall.reflect(direction);
        let restart = bounce.point + reflected * EPSILON;
        let t2 = time_to_line(restart, reflected, target_y).filter(|t| *t > 0.0)?;

        Some(PredictionResult {
            target: restart + reflected * t2,
            time_to_impact: Some((bounce.t + t2) / self.frame_rate),
            bounced: true,
            bounce_point: Some(bounce.point),
            wall: Some(bounce.wall),
        })
    }
}
