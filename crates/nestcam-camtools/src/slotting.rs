//! Slot clearing.
//!
//! An elongated hole is cleared completely instead of only outlined, so no
//! loose slug is left inside it. The slot is cut as contour-parallel rings
//! offset inward from the wall by the tool radius plus whole stepovers, with
//! one last ring at the deepest offset that still exists so the middle is
//! never left standing. Rings are cut innermost first at every depth pass and
//! each ring is entered by ramping down along its own path.

use crate::contouring::ProfileSide;
use crate::error::CamToolResult;
use crate::offset::offset_polygon;
use crate::params::CutParameters;
use crate::path::ClosedPath;
use crate::toolpath::{Move, MovePurpose, Position, Toolpath};
use nestcam_core::constants::EPSILON;
use nestcam_core::error::require_positive;
use nestcam_core::ConfigurationError;
use nestcam_geometry::Polygon;
use nestcam_settings::{Config, CutDirection};
use tracing::debug;

/// Precision of the deepest ring search in mm.
const DEEPEST_PRECISION: f64 = 0.01;

/// Length to width ratio of the rectangle with the same area and perimeter
/// as `polygon`. Shapes too compact for such a rectangle report 1.
pub fn elongation(polygon: &Polygon) -> f64 {
    let half = polygon.perimeter() / 2.0;
    let area = polygon.area();
    let disc = half * half / 4.0 - area;
    if area <= EPSILON || disc <= 0.0 {
        return 1.0;
    }
    let root = disc.sqrt();
    let short = half / 2.0 - root;
    if short <= EPSILON {
        f64::INFINITY
    } else {
        (half / 2.0 + root) / short
    }
}

/// Generator for slot clearing toolpaths.
#[derive(Debug, Clone)]
pub struct SlotGenerator {
    params: CutParameters,
    /// Distance between rings in mm.
    stepover: f64,
    ramp_ratio: f64,
    min_aspect_ratio: f64,
    direction: CutDirection,
    arc_tolerance: f64,
}

impl SlotGenerator {
    pub fn new(params: CutParameters, config: &Config) -> CamToolResult<Self> {
        let slotting = &config.slotting;
        require_positive("slotting.stepover", slotting.stepover)?;
        require_positive("slotting.ramp_ratio", slotting.ramp_ratio)?;
        Ok(Self {
            stepover: slotting.stepover.min(1.0) * params.tool_diameter,
            ramp_ratio: slotting.ramp_ratio,
            min_aspect_ratio: slotting.min_aspect_ratio,
            direction: config.cutting.direction,
            arc_tolerance: config.cutting.arc_tolerance,
            params,
        })
    }

    pub fn from_config(config: &Config) -> CamToolResult<Self> {
        Self::new(CutParameters::from_config(config)?, config)
    }

    /// Whether `hole` is elongated enough to be cleared as a slot.
    pub fn is_slot(&self, hole: &Polygon) -> bool {
        elongation(hole) >= self.min_aspect_ratio
    }

    /// Clearing rings from the wall inward, oriented for the milling direction.
    pub fn rings(&self, slot: &Polygon, label: &str) -> CamToolResult<Vec<Polygon>> {
        let radius = self.params.tool_radius();
        if offset_polygon(slot, -radius, self.arc_tolerance)?.is_empty() {
            return Err(ConfigurationError::FeatureTooNarrow {
                feature: label.to_string(),
                tool_diameter: self.params.tool_diameter,
            }
            .into());
        }

        let deepest = self.deepest_offset(slot, radius)?;
        let mut distances = vec![radius];
        let mut next = radius + self.stepover;
        while next < deepest - EPSILON {
            distances.push(next);
            next += self.stepover;
        }
        if distances.last().is_some_and(|last| deepest - last > EPSILON) {
            distances.push(deepest);
        }

        let clockwise = ProfileSide::Inside.clockwise(self.direction);
        let mut rings = Vec::new();
        for distance in distances {
            for ring in offset_polygon(slot, -distance, self.arc_tolerance)? {
                rings.push(if clockwise { ring.reversed() } else { ring });
            }
        }
        Ok(rings)
    }

    /// Largest inward offset that still leaves a ring.
    fn deepest_offset(&self, slot: &Polygon, from: f64) -> CamToolResult<f64> {
        let Some(bounds) = slot.bounds() else {
            return Ok(from);
        };
        // Nothing survives an offset of half the narrowest extent
        let mut lo = from;
        let mut hi = bounds.width().min(bounds.height()) / 2.0 + EPSILON;
        while hi - lo > DEEPEST_PRECISION {
            let mid = (lo + hi) / 2.0;
            if offset_polygon(slot, -mid, self.arc_tolerance)?.is_empty() {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(lo)
    }

    /// Full clearing toolpath for one slot.
    pub fn generate(&self, slot: &Polygon, label: &str) -> CamToolResult<Toolpath> {
        let rings = self.rings(slot, label)?;
        let paths: Vec<ClosedPath> = rings
            .iter()
            .rev()
            .map(ClosedPath::new)
            .filter(|p| p.len() >= 3)
            .collect();

        let mut toolpath = Toolpath::new(label);
        let mut previous = 0.0;
        for &depth in self.params.depths.depths() {
            for path in &paths {
                self.ramp_lap(&mut toolpath, path, previous, depth);
            }
            previous = depth;
        }
        debug!(
            "{}: {} rings, {} passes, stepover {:.3}mm",
            label,
            paths.len(),
            self.params.depths.passes(),
            self.stepover
        );
        Ok(toolpath)
    }

    /// Ramps from `from_depth` to `depth` along the ring, then cuts one full
    /// lap at `depth` so the ramped stretch is cleaned up too.
    fn ramp_lap(&self, toolpath: &mut Toolpath, path: &ClosedPath, from_depth: f64, depth: f64) {
        let safety = self.params.safety_height;
        let feed = self.params.feed_rate;
        let entry = path.point_at(0.0);
        let ramp = (self.ramp_ratio * (depth - from_depth)).min(path.length());

        toolpath.push(Move::rapid(Position::at(entry, safety)));
        toolpath.push(Move::plunge(
            Position::at(entry, -from_depth),
            self.params.plunge_rate,
            MovePurpose::Slot,
        ));
        for (d, point) in path.span(0.0, ramp) {
            let z = -(from_depth + (depth - from_depth) * d / ramp);
            toolpath.push(Move::linear(
                Position::at(point, z),
                self.params.plunge_rate,
                MovePurpose::Slot,
            ));
        }
        for (_, point) in path.span(ramp, path.length()) {
            toolpath.push(Move::linear(
                Position::at(point, -depth),
                feed,
                MovePurpose::Slot,
            ));
        }
        toolpath.push(Move::retract(Position::at(path.point_at(ramp), safety)));
    }
}
