//! Detector output: per-frame object observations
//!
//! The detector reports up to two objects per frame with a best-effort class
//! hint. `assign_roles` turns that into at most one puck and one paddle.

use serde::{Deserialize, Serialize};

use super::geometry::Vec2;

/// Class hint attached by the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Puck,
    Paddle,
    #[default]
    Unknown,
}

/// One detected object in one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub position: Vec2,
    pub radius: f32,
    #[serde(default)]
    pub class: ObjectClass,
}

impl Observation {
    pub fn new(position: Vec2, radius: f32, class: ObjectClass) -> Self {
        Self { position, radius, class }
    }

    pub fn puck(x: f32, y: f32) -> Self {
        Self::new(Vec2::new(x, y), 0.0, ObjectClass::Puck)
    }

    pub fn paddle(x: f32, y: f32) -> Self {
        Self::new(Vec2::new(x, y), 0.0, ObjectClass::Paddle)
    }
}

/// Everything the detector saw in one camera frame
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonic capture time (s)
    pub timestamp: f64,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl Frame {
    pub fn new(timestamp: f64, observations: Vec<Observation>) -> Self {
        Self { timestamp, observations }
    }

    pub fn empty(timestamp: f64) -> Self {
        Self::new(timestamp, Vec::new())
    }
}

/// Puck and paddle picked out of one frame's observations
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameObservations {
    pub puck: Option<Observation>,
    pub paddle: Option<Observation>,
}

impl FrameObservations {
    /// Assign puck/paddle roles from class hints and radii.
    ///
    /// Only the two largest observations are considered. A class hint is
    /// never overridden: a second object with an already-taken class is
    /// dropped. A lone `Unknown` is the puck; an `Unknown` beside a
    /// classified object takes the other role; between two `Unknown`s the
    /// smaller one is the puck.
    pub fn assign_roles(observations: &[Observation]) -> Self {
        let mut kept: Vec<Observation> = observations
            .iter()
            .copied()
            .filter(|o| o.position.is_finite())
            .collect();
        kept.sort_by(|a, b| b.radius.total_cmp(&a.radius));
        kept.truncate(2);

        let mut roles = Self::default();
        let mut unknown = Vec::new();
        for obs in kept {
            match obs.class {
                ObjectClass::Puck => {
                    if roles.puck.is_none() {
                        roles.puck = Some(obs);
                    } else {
                        log::trace!("Dropping second puck at {:?}", obs.position);
                    }
                }
                ObjectClass::Paddle => {
                    if roles.paddle.is_none() {
                        roles.paddle = Some(obs);
                    } else {
                        log::trace!("Dropping second paddle at {:?}", obs.position);
                    }
                }
                ObjectClass::Unknown => unknown.push(obs),
            }
        }

        // `unknown` is sorted by descending radius: the smallest comes last
        while let Some(obs) = unknown.pop() {
            if roles.puck.is_none() {
                roles.puck = Some(obs);
            } else if roles.paddle.is_none() {
                roles.paddle = Some(obs);
            }
        }

        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknown(x: f32, y: f32, r: f32) -> Observation {
        Observation::new(Vec2::new(x, y), r, ObjectClass::Unknown)
    }

    #[test]
    fn test_empty_frame() {
        let roles = FrameObservations::assign_roles(&[]);
        assert!(roles.puck.is_none());
        assert!(roles.paddle.is_none());
    }

    #[test]
    fn test_class_hints_are_respected() {
        let roles = FrameObservations::assign_roles(&[
            Observation::paddle(10.0, 300.0),
            Observation::puck(50.0, 100.0),
        ]);
        assert_eq!(roles.puck.unwrap().position, Vec2::new(50.0, 100.0));
        assert_eq!(roles.paddle.unwrap().position, Vec2::new(10.0, 300.0));
    }

    #[test]
    fn test_single_unknown_is_puck() {
        let roles = FrameObservations::assign_roles(&[unknown(5.0, 5.0, 20.0)]);
        assert!(roles.puck.is_some());
        assert!(roles.paddle.is_none());
    }

    #[test]
    fn test_unknown_takes_complementary_role() {
        let roles =
            FrameObservations::assign_roles(&[Observation::puck(1.0, 1.0), unknown(9.0, 9.0, 0.0)]);
        assert_eq!(roles.paddle.unwrap().position, Vec2::new(9.0, 9.0));
    }

    #[test]
    fn test_two_unknowns_smaller_is_puck() {
        let roles = FrameObservations::assign_roles(&[
            unknown(100.0, 100.0, 18.0),
            unknown(200.0, 300.0, 30.0),
        ]);
        assert_eq!(roles.puck.unwrap().radius, 18.0);
        assert_eq!(roles.paddle.unwrap().radius, 30.0);
    }

    #[test]
    fn test_only_two_largest_are_kept() {
        let roles = FrameObservations::assign_roles(&[
            unknown(1.0, 1.0, 5.0),
            unknown(2.0, 2.0, 25.0),
            unknown(3.0, 3.0, 20.0),
        ]);
        assert_eq!(roles.puck.unwrap().radius, 20.0);
        assert_eq!(roles.paddle.unwrap().radius, 25.0);
    }

    #[test]
    fn test_duplicate_puck_hint_is_not_a_paddle() {
        let roles = FrameObservations::assign_roles(&[
            Observation::new(Vec2::new(40.0, 60.0), 18.0, ObjectClass::Puck),
            Observation::new(Vec2::new(150.0, 350.0), 20.0, ObjectClass::Puck),
        ]);
        assert_eq!(roles.puck.unwrap().position, Vec2::new(150.0, 350.0));
        assert!(roles.paddle.is_none());
    }

    #[test]
    fn test_duplicate_paddle_hint_is_not_a_puck() {
        let roles = FrameObservations::assign_roles(&[
            Observation::paddle(10.0, 300.0),
            Observation::paddle(90.0, 320.0),
        ]);
        assert!(roles.puck.is_none());
        assert_eq!(roles.paddle.unwrap().position, Vec2::new(10.0, 300.0));
    }

    #[test]
    fn test_non_finite_positions_are_dropped() {
        let roles = FrameObservations::assign_roles(&[unknown(f32::NAN, 1.0, 40.0)]);
        assert!(roles.puck.is_none());
    }

    #[test]
    fn test_frame_json_shape() {
        let json = r#"{"timestamp": 0.5, "observations": [
            {"position": {"x": 1.0, "y": 2.0}, "radius": 12.0, "class": "paddle"},
            {"position": {"x": 3.0, "y": 4.0}, "radius": 8.0}
        ]}"#;
        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.observations.len(), 2);
        assert_eq!(frame.observations[0].class, ObjectClass::Paddle);
        assert_eq!(frame.observations[1].class, ObjectClass::Unknown);
    }
}
