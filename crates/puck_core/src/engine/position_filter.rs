//! Exponential position smoothing
//!
//! Tracks one object's smoothed position and its per-frame displacement.
//! Velocity is in pixels/frame; the predictor converts to seconds with the
//! configured frame rate.

use serde::{Deserialize, Serialize};

use super::geometry::Vec2;

/// Smoothed position/velocity estimate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SmoothedState {
    pub position: Vec2,
    /// Displacement between the last two smoothed samples (zero until two exist)
    pub velocity: Vec2,
    pub initialized: bool,
}

impl SmoothedState {
    /// Speed magnitude (px/frame)
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Exponential moving average over raw detections
#[derive(Debug, Clone)]
pub struct PositionFilter {
    alpha: f32,
    state: SmoothedState,
}

impl PositionFilter {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            state: SmoothedState::default(),
        }
    }

    /// Fold one raw detection into the estimate.
    ///
    /// The first sample is taken as-is with zero velocity. Frames without a
    /// detection must not call this: the previous state is kept instead.
    pub fn update(&mut self, raw: Vec2) -> SmoothedState {
        if !self.state.initialized {
            self.state = SmoothedState {
                position: raw,
                velocity: Vec2::ZERO,
                initialized: true,
            };
            return self.state;
        }

        let prev = self.state.position;
        let smoothed = raw * self.alpha + prev * (1.0 - self.alpha);
        self.state.position = smoothed;
        self.state.velocity = smoothed - prev;
        self.state
    }

    pub fn state(&self) -> SmoothedState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.state = SmoothedState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        let mut filter = PositionFilter::new(0.3);
        let state = filter.update(Vec2::new(120.0, 80.0));
        assert!(state.initialized);
        assert_eq!(state.position, Vec2::new(120.0, 80.0));
        assert_eq!(state.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_second_sample_blends_and_sets_velocity() {
        let mut filter = PositionFilter::new(0.3);
        filter.update(Vec2::new(100.0, 100.0));
        let state = filter.update(Vec2::new(110.0, 90.0));
        assert!((state.position.x - 103.0).abs() < 1e-4);
        assert!((state.position.y - 97.0).abs() < 1e-4);
        assert!((state.velocity.x - 3.0).abs() < 1e-4);
        assert!((state.velocity.y + 3.0).abs() < 1e-4);
        assert!((state.speed() - (18.0f32).sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_geometric_convergence() {
        let alpha = 0.3;
        let mut filter = PositionFilter::new(alpha);
        filter.update(Vec2::new(0.0, 0.0));

        let target = Vec2::new(100.0, -50.0);
        for n in 1..=20 {
            let state = filter.update(target);
            let ratio = (1.0f32 - alpha).powi(n);
            let expected = Vec2::new(100.0 * (1.0 - ratio), -50.0 * (1.0 - ratio));
            assert!((state.position.x - expected.x).abs() < 1e-3, "step {}", n);
            assert!((state.position.y - expected.y).abs() < 1e-3, "step {}", n);
        }
    }

    #[test]
    fn test_occlusion_resumes_from_retained_state() {
        let mut occluded = PositionFilter::new(0.5);
        let mut steady = PositionFilter::new(0.5);
        for raw in [Vec2::new(10.0, 10.0), Vec2::new(20.0, 30.0)] {
            occluded.update(raw);
            steady.update(raw);
        }
        let held = occluded.state();
        assert_eq!(held.position, Vec2::new(15.0, 20.0));
        assert_eq!(held.velocity, Vec2::new(5.0, 10.0));

        // Gap of several frames with no detection, then the puck reappears
        for _ in 0..5 {
            assert_eq!(occluded.state(), held);
        }
        let resumed = occluded.update(Vec2::new(25.0, 40.0));
        let reference = steady.update(Vec2::new(25.0, 40.0));

        assert_eq!(resumed.position, Vec2::new(20.0, 30.0));
        // One frame of displacement, not the gap length times the speed
        assert_eq!(resumed.velocity, Vec2::new(5.0, 10.0));
        assert_eq!(resumed.position.x.to_bits(), reference.position.x.to_bits());
        assert_eq!(resumed.position.y.to_bits(), reference.position.y.to_bits());
        assert_eq!(resumed.velocity.y.to_bits(), reference.velocity.y.to_bits());
    }

    #[test]
    fn test_reset() {
        let mut filter = PositionFilter::new(0.5);
        filter.update(Vec2::new(1.0, 1.0));
        filter.reset();
        assert!(!filter.is_initialized());
        let state = filter.update(Vec2::new(7.0, 7.0));
        assert_eq!(state.position, Vec2::new(7.0, 7.0));
    }
}
