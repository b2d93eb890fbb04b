//! Nesting results.

use crate::part::NestPart;
use crate::transform::PartTransform;
use nestcam_geometry::{Part, Polygon, QuarterTurn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a part was left off the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementFailure {
    /// No allowed rotation fits the sheet even when it is empty.
    ExceedsSheet { width: f64, height: f64 },
    /// The sheet is big enough but no free position was left.
    NoFreePosition,
}

impl fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceedsSheet { width, height } => write!(
                f,
                "part of {:.1} x {:.1}mm is larger than the sheet in every rotation",
                width, height
            ),
            Self::NoFreePosition => write!(f, "no free position left on the sheet"),
        }
    }
}

/// A part placed on the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Index of the part in the input list.
    pub index: usize,
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub rotation: QuarterTurn,
    pub width: f64,
    pub height: f64,
    pub transform: PartTransform,
}

impl Placement {
    /// Collision polygon of `part` in sheet coordinates.
    pub fn outline(&self, part: &NestPart) -> Polygon {
        self.transform.apply(&part.outline())
    }

    /// Every classified part of `part` in sheet coordinates.
    pub fn placed_parts(&self, part: &NestPart) -> Vec<Part> {
        part.all_parts().map(|p| self.transform.apply(p)).collect()
    }
}

/// A part that could not be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnfittedPart {
    pub index: usize,
    pub id: String,
    pub reason: PlacementFailure,
}

/// Outcome of one nesting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestingResult {
    pub sheet_width: f64,
    pub sheet_height: f64,
    pub spacing: f64,
    /// Placements in the order parts were placed (largest first).
    pub placements: Vec<Placement>,
    pub unfitted: Vec<UnfittedPart>,
    /// Placed material area over sheet area, in percent.
    pub utilization_percent: f64,
    pub placed_count: usize,
    pub total_parts: usize,
    pub message: String,
}

impl NestingResult {
    pub fn all_placed(&self) -> bool {
        self.unfitted.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
