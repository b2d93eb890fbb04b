//! Tool compensation by parallel offset.
//!
//! Contours are handed to `cavalier_contours` clockwise, where a positive
//! offset grows the shape and a negative one shrinks it. Offset corners
//! come back as bulged arcs; they are flattened to points within the arc
//! tolerance because the contouring code cuts straight segments.

use crate::error::{CamToolError, CamToolResult};
use cavalier_contours::polyline::{PlineSource, PlineSourceMut, PlineVertex, Polyline};
use nestcam_core::constants::EPSILON;
use nestcam_core::Point;
use nestcam_geometry::entity::bulge_arc;
use nestcam_geometry::Polygon;
use std::f64::consts::PI;
use std::panic;
use tracing::warn;

/// Offsets `polygon` by `distance`: positive grows it, negative shrinks it.
///
/// Returns every resulting ring, counter-clockwise, largest first. A shrink
/// that consumes the whole polygon returns an empty list.
pub fn offset_polygon(
    polygon: &Polygon,
    distance: f64,
    arc_tolerance: f64,
) -> CamToolResult<Vec<Polygon>> {
    if distance.abs() < EPSILON {
        return Ok(vec![polygon.to_ccw()]);
    }
    let pline = to_polyline(polygon);
    let results = panic::catch_unwind(panic::AssertUnwindSafe(|| pline.parallel_offset(distance)))
        .map_err(|_| {
            warn!("Parallel offset panicked for {} vertex contour", polygon.len());
            CamToolError::OffsetFailed(format!(
                "offset of {:.3}mm failed for a {} vertex contour",
                distance,
                polygon.len()
            ))
        })?;

    let mut rings: Vec<Polygon> = results
        .iter()
        .filter(|p| p.is_closed())
        .map(|p| flatten(p, arc_tolerance))
        .filter(Polygon::is_valid)
        .map(|p| p.to_ccw())
        .collect();
    rings.sort_by(|a, b| b.area().total_cmp(&a.area()));
    Ok(rings)
}

/// Clockwise closed polyline. [`Polygon`] has already dropped repeated vertices.
fn to_polyline(polygon: &Polygon) -> Polyline<f64> {
    let ring = if polygon.is_ccw() {
        polygon.reversed()
    } else {
        polygon.clone()
    };
    let mut pline = Polyline::new();
    for p in ring.points() {
        pline.add_vertex(PlineVertex::new(p.x, p.y, 0.0));
    }
    pline.set_is_closed(true);
    pline
}

/// Replaces bulged segments with chords no further than `tolerance` from the arc.
fn flatten(pline: &Polyline<f64>, tolerance: f64) -> Polygon {
    let vertices = &pline.vertex_data;
    let n = vertices.len();
    let mut points = Vec::with_capacity(n);
    for i in 0..n {
        let v = vertices[i];
        let from = Point::new(v.x, v.y);
        points.push(from);
        if v.bulge.abs() < EPSILON {
            continue;
        }
        let next = vertices[(i + 1) % n];
        let to = Point::new(next.x, next.y);
        let (center, radius, start, sweep) = bulge_arc(from, to, v.bulge);
        let segments = arc_segment_count(radius, sweep.abs(), tolerance);
        for k in 1..segments {
            let angle = start + sweep * k as f64 / segments as f64;
            points.push(Point::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            ));
        }
    }
    Polygon::new(points)
}

/// Chords needed so that no chord strays more than `tolerance` from the arc.
fn arc_segment_count(radius: f64, sweep: f64, tolerance: f64) -> usize {
    if radius <= tolerance {
        return ((sweep / (PI / 2.0)).ceil() as usize).max(1);
    }
    let max_angle = 2.0 * (1.0 - tolerance / radius).acos();
    ((sweep / max_angle).ceil() as usize).clamp(1, 360)
}
