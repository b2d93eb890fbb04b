//! Toolpath move model.
//!
//! A toolpath is an ordered list of moves. Z is measured from the stock
//! surface: `0.0` is the top of the material and cutting depths are
//! negative.

use nestcam_core::Point;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Kinds of machine motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveType {
    /// Positioning move at rapid rate.
    Rapid,
    /// Straight vertical feed into the material.
    Plunge,
    /// Straight feed move, possibly changing Z.
    Linear,
    /// Clockwise arc. A Z change makes it a helix.
    ArcCw,
    /// Counter-clockwise arc. A Z change makes it a helix.
    ArcCcw,
    /// Rapid vertical move out of the material.
    Retract,
}

impl MoveType {
    pub fn is_arc(&self) -> bool {
        matches!(self, Self::ArcCw | Self::ArcCcw)
    }

    pub fn is_rapid(&self) -> bool {
        matches!(self, Self::Rapid | Self::Retract)
    }
}

/// What a move is for. The post-processor comments changes of purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovePurpose {
    Travel,
    Boring,
    InsideContour,
    OutsideContour,
    Slot,
    Tab,
    LeadIn,
    LeadOut,
}

impl MovePurpose {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Travel => "Travel",
            Self::Boring => "Boring",
            Self::InsideContour => "Inside contour",
            Self::OutsideContour => "Outside contour",
            Self::Slot => "Slot",
            Self::Tab => "Tab",
            Self::LeadIn => "Lead in",
            Self::LeadOut => "Lead out",
        }
    }
}

/// A position in machine space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn at(point: Point, z: f64) -> Self {
        Self::new(point.x, point.y, z)
    }

    pub fn xy(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A single move to `target`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub kind: MoveType,
    pub target: Position,
    /// Absolute arc centre, for arc moves only.
    pub center: Option<Point>,
    /// Feed rate in mm/min. Rapid moves have none.
    pub feed: Option<f64>,
    pub purpose: MovePurpose,
}

impl Move {
    pub fn rapid(target: Position) -> Self {
        Self {
            kind: MoveType::Rapid,
            target,
            center: None,
            feed: None,
            purpose: MovePurpose::Travel,
        }
    }

    pub fn retract(target: Position) -> Self {
        Self {
            kind: MoveType::Retract,
            ..Self::rapid(target)
        }
    }

    pub fn plunge(target: Position, feed: f64, purpose: MovePurpose) -> Self {
        Self {
            kind: MoveType::Plunge,
            target,
            center: None,
            feed: Some(feed),
            purpose,
        }
    }

    pub fn linear(target: Position, feed: f64, purpose: MovePurpose) -> Self {
        Self {
            kind: MoveType::Linear,
            target,
            center: None,
            feed: Some(feed),
            purpose,
        }
    }

    /// Arc (or helix when Z changes) about `center`.
    pub fn arc(
        clockwise: bool,
        target: Position,
        center: Point,
        feed: f64,
        purpose: MovePurpose,
    ) -> Self {
        Self {
            kind: if clockwise {
                MoveType::ArcCw
            } else {
                MoveType::ArcCcw
            },
            target,
            center: Some(center),
            feed: Some(feed),
            purpose,
        }
    }

    /// Length of the move starting from `from`. Arcs whose end equals
    /// their start are full circles.
    pub fn length_from(&self, from: &Position) -> f64 {
        match (self.kind, self.center) {
            (MoveType::ArcCw | MoveType::ArcCcw, Some(c)) => {
                let radius = c.distance_to(&from.xy());
                let start = (from.y - c.y).atan2(from.x - c.x);
                let end = (self.target.y - c.y).atan2(self.target.x - c.x);
                let mut sweep = if self.kind == MoveType::ArcCcw {
                    end - start
                } else {
                    start - end
                };
                if sweep <= 1e-9 {
                    sweep += 2.0 * PI;
                }
                let planar = radius * sweep;
                let dz = self.target.z - from.z;
                (planar * planar + dz * dz).sqrt()
            }
            _ => from.distance_to(&self.target),
        }
    }
}

/// An ordered list of moves for one feature.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Toolpath {
    /// Short description used in program comments.
    pub label: String,
    pub moves: Vec<Move>,
}

impl Toolpath {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            moves: Vec::new(),
        }
    }

    pub fn push(&mut self, m: Move) {
        self.moves.push(m);
    }

    pub fn extend(&mut self, moves: impl IntoIterator<Item = Move>) {
        self.moves.extend(moves);
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// XY of the first move, where the tool enters this feature.
    pub fn start(&self) -> Option<Point> {
        self.moves.first().map(|m| m.target.xy())
    }

    /// XY of the last move.
    pub fn end(&self) -> Option<Point> {
        self.moves.last().map(|m| m.target.xy())
    }

    pub fn count(&self, kind: MoveType) -> usize {
        self.moves.iter().filter(|m| m.kind == kind).count()
    }

    /// Deepest Z reached.
    pub fn min_z(&self) -> Option<f64> {
        self.moves.iter().map(|m| m.target.z).reduce(f64::min)
    }

    /// Cutting and rapid lengths, starting from `from`.
    pub fn lengths_from(&self, from: Position) -> (f64, f64) {
        let mut current = from;
        let mut cut = 0.0;
        let mut rapid = 0.0;
        for m in &self.moves {
            let length = m.length_from(&current);
            if m.kind.is_rapid() {
                rapid += length;
            } else {
                cut += length;
            }
            current = m.target;
        }
        (cut, rapid)
    }
}
