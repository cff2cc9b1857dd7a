//! Table-space geometry
//!
//! All positions are warped-table pixels: origin at the top-left corner,
//! x grows to the right, y grows toward the human player's goal.
//! The robot defends the top edge (y = 0).

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

use super::constants::geometry::EPSILON;
use crate::error::{CoreError, Result};

/// 2D point or vector in table pixels (or pixels/frame for velocities)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector, or `None` when the length is below `EPSILON`
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len < EPSILON {
            None
        } else {
            Some(Vec2::new(self.x / len, self.y / len))
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Playing surface bounds, fixed for the whole session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub width: f32,
    pub height: f32,
}

impl Table {
    /// Build a table, rejecting non-finite or non-positive bounds
    pub fn new(width: f32, height: f32) -> Result<Self> {
        let table = Self { width, height };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        let ok = |v: f32| v.is_finite() && v > 0.0;
        if ok(self.width) && ok(self.height) {
            Ok(())
        } else {
            Err(CoreError::InvalidTable { width: self.width, height: self.height })
        }
    }

    /// y of the half-line separating the robot half (above) from the human half
    pub fn midline_y(&self) -> f32 {
        self.height * 0.5
    }

    /// Center of the human player's goal (bottom edge)
    pub fn human_goal(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_ops() {
        let a = Vec2::new(3.0, 4.0);
        let b = Vec2::new(1.0, 1.0);
        assert_eq!(a + b, Vec2::new(4.0, 5.0));
        assert_eq!(a - b, Vec2::new(2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(6.0, 8.0));
        assert_eq!(-b, Vec2::new(-1.0, -1.0));
        assert!((a.length() - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_rejects_tiny_vectors() {
        assert!(Vec2::new(1e-4, 0.0).normalized().is_none());
        let u = Vec2::new(0.0, -10.0).normalized().unwrap();
        assert_eq!(u, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_table_validation() {
        assert!(Table::new(640.0, 480.0).is_ok());
        assert!(Table::new(0.0, 480.0).is_err());
        assert!(Table::new(640.0, -1.0).is_err());
        assert!(Table::new(f32::NAN, 480.0).is_err());
    }

    #[test]
    fn test_table_landmarks() {
        let table = Table::new(200.0, 400.0).unwrap();
        assert_eq!(table.midline_y(), 200.0);
        assert_eq!(table.human_goal(), Vec2::new(100.0, 400.0));
        assert!(table.contains(Vec2::new(200.0, 0.0)));
        assert!(!table.contains(Vec2::new(-0.1, 10.0)));
        assert_eq!(table.clamp(Vec2::new(-5.0, 500.0)), Vec2::new(0.0, 400.0));
    }
}
