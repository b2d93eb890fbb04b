//! Nested drawing export.
//!
//! The sheet outline goes on layer `SHEET` in red. Every placed part's
//! original entities keep their layer and are drawn in yellow, moved by
//! the same [`crate::PartTransform`] that was used for collision checks.

use crate::error::NestResult;
use crate::part::NestPart;
use crate::result::NestingResult;
use dxf::Drawing;
use nestcam_geometry::{new_drawing, save_drawing, to_dxf_entity, Geometry};
use std::path::Path;
use tracing::{debug, warn};

pub const SHEET_LAYER: &str = "SHEET";
const SHEET_COLOR: u8 = 1;
const PART_COLOR: u8 = 2;

/// Builds the nested drawing for `result`.
pub fn nested_drawing(parts: &[NestPart], result: &NestingResult) -> Drawing {
    let mut drawing = new_drawing();
    drawing.add_entity(to_dxf_entity(
        &Geometry::rectangle(0.0, 0.0, result.sheet_width, result.sheet_height),
        SHEET_LAYER,
        SHEET_COLOR,
    ));

    for placement in &result.placements {
        let Some(part) = parts.get(placement.index) else {
            warn!("Placement for {} refers to a missing part", placement.id);
            continue;
        };
        for entity in &part.entities {
            let geometry = placement.transform.apply(&entity.geometry);
            drawing.add_entity(to_dxf_entity(&geometry, &entity.layer, PART_COLOR));
        }
        debug!("Exported {} entities for {}", part.entities.len(), part.id);
    }
    drawing
}

/// Writes the nested drawing to `path`.
pub fn write_nested_dxf(parts: &[NestPart], result: &NestingResult, path: &Path) -> NestResult<()> {
    let drawing = nested_drawing(parts, result);
    save_drawing(&drawing, path)?;
    Ok(())
}
