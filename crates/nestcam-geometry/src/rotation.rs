//! Exact quarter-turn rotations.
//!
//! Parts are only ever rotated by multiples of 90°, so rotation is done by
//! swapping and negating coordinates instead of going through `sin`/`cos`.
//! Areas and bounding boxes survive bit-for-bit and nesting stays
//! reproducible.

use nestcam_core::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A counter-clockwise rotation by a multiple of 90°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum QuarterTurn {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl QuarterTurn {
    /// All rotations in search order.
    pub const ALL: [QuarterTurn; 4] = [
        QuarterTurn::Deg0,
        QuarterTurn::Deg90,
        QuarterTurn::Deg180,
        QuarterTurn::Deg270,
    ];

    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees % 360 {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether width and height trade places under this rotation.
    pub fn swaps_axes(&self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }

    /// Rotates `p` counter-clockwise about `pivot`.
    pub fn rotate_point(&self, p: Point, pivot: Point) -> Point {
        let dx = p.x - pivot.x;
        let dy = p.y - pivot.y;
        let (rx, ry) = match self {
            Self::Deg0 => (dx, dy),
            Self::Deg90 => (-dy, dx),
            Self::Deg180 => (-dx, -dy),
            Self::Deg270 => (dy, -dx),
        };
        Point::new(pivot.x + rx, pivot.y + ry)
    }
}

impl From<QuarterTurn> for u32 {
    fn from(turn: QuarterTurn) -> u32 {
        turn.degrees()
    }
}

impl TryFrom<u32> for QuarterTurn {
    type Error = String;

    fn try_from(degrees: u32) -> Result<Self, Self::Error> {
        Self::from_degrees(degrees).ok_or_else(|| format!("{degrees}° is not a quarter turn"))
    }
}

impl fmt::Display for QuarterTurn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}
