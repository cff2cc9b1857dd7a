//! Move command framing

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ControllerScale;
use crate::engine::geometry::{Table, Vec2};
use crate::error::CommandError;

/// Frame length including the `\r\n` terminator
pub const FRAME_LEN: usize = 11;

const BODY_LEN: usize = 9;

/// Absolute move in controller coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveCommand {
    pub x: u16,
    pub y: u16,
}

impl MoveCommand {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}\r\n", self).into_bytes()
    }

    /// Decode a frame the way the controller firmware does.
    ///
    /// Trailing `\r`/`\n` bytes are ignored; the body must be exactly
    /// `M` followed by eight ASCII digits.
    pub fn parse(frame: &[u8]) -> Result<Self, CommandError> {
        let end = frame
            .iter()
            .rposition(|b| *b != b'\r' && *b != b'\n')
            .map_or(0, |i| i + 1);
        let body = &frame[..end];

        if body.len() != BODY_LEN {
            return Err(CommandError::Length(body.len()));
        }
        if body[0] != b'M' {
            return Err(CommandError::Prefix);
        }

        let field = |start: usize| -> Result<u16, CommandError> {
            body[start..start + 4]
                .iter()
                .enumerate()
                .try_fold(0u16, |acc, (i, b)| {
                    if b.is_ascii_digit() {
                        Ok(acc * 10 + u16::from(b - b'0'))
                    } else {
                        Err(CommandError::Digit { offset: start + i, byte: *b })
                    }
                })
        };

        Ok(Self { x: field(1)?, y: field(5)? })
    }
}

impl fmt::Display for MoveCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{:04}{:04}", self.x, self.y)
    }
}

/// Maps table-pixel targets onto the controller's coordinate range
#[derive(Debug, Clone)]
pub struct CommandEncoder {
    scale: ControllerScale,
}

impl CommandEncoder {
    pub fn new(scale: ControllerScale) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> &ControllerScale {
        &self.scale
    }

    /// Clamp `target` into the table, normalize, and scale per axis
    pub fn encode(&self, target: Vec2, table: &Table) -> MoveCommand {
        let s = &self.scale;
        let fx = axis_fraction(target.x, table.width, s.flip_x);
        let fy = axis_fraction(target.y, table.height, s.flip_y);
        MoveCommand {
            x: scale_axis(fx, s.x_min, s.x_max),
            y: scale_axis(fy, s.y_min, s.y_max),
        }
    }

    pub fn encode_bytes(&self, target: Vec2, table: &Table) -> Vec<u8> {
        self.encode(target, table).to_bytes()
    }
}

fn axis_fraction(value: f32, extent: f32, flip: bool) -> f32 {
    let f = if value.is_nan() { 0.0 } else { (value / extent).clamp(0.0, 1.0) };
    if flip {
        1.0 - f
    } else {
        f
    }
}

fn scale_axis(fraction: f32, min: u16, max: u16) -> u16 {
    let span = f32::from(max) - f32::from(min);
    let v = (f32::from(min) + fraction * span).round();
    v.clamp(f32::from(min), f32::from(max)) as u16
}
