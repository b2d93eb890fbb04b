//! Drawing entities.
//!
//! [`Geometry`] is the closed set of primitives a part drawing is made of.
//! Every transform and export matches on it exhaustively, so a new kind of
//! entity has to be handled everywhere before the crate compiles again.

use crate::rotation::QuarterTurn;
use nestcam_core::constants::EPSILON;
use nestcam_core::{Bounds, Point};
use serde::{Deserialize, Serialize};

/// Points used when a full circle is turned into a polygon.
pub const CIRCLE_SEGMENTS: usize = 64;

/// A polyline vertex with the bulge of the segment that starts at it.
///
/// Bulge is `tan(sweep / 4)`; positive values sweep counter-clockwise and
/// zero means a straight segment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolylineVertex {
    pub point: Point,
    pub bulge: f64,
}

impl PolylineVertex {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            bulge: 0.0,
        }
    }

    pub fn with_bulge(x: f64, y: f64, bulge: f64) -> Self {
        Self {
            point: Point::new(x, y),
            bulge,
        }
    }
}

/// A planar drawing primitive. Angles are degrees, counter-clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Line {
        start: Point,
        end: Point,
    },
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Circle {
        center: Point,
        radius: f64,
    },
    Polyline {
        vertices: Vec<PolylineVertex>,
        closed: bool,
    },
}

/// A drawing entity together with the layer it was found on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntity {
    pub layer: String,
    pub geometry: Geometry,
}

impl SourceEntity {
    pub fn new(layer: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            layer: layer.into(),
            geometry,
        }
    }
}

impl Geometry {
    pub fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::Line {
            start: Point::new(x1, y1),
            end: Point::new(x2, y2),
        }
    }

    /// Closed polyline through `points` with straight segments.
    pub fn closed_polyline(points: &[(f64, f64)]) -> Self {
        Self::Polyline {
            vertices: points
                .iter()
                .map(|&(x, y)| PolylineVertex::new(x, y))
                .collect(),
            closed: true,
        }
    }

    /// Axis-aligned rectangle as a closed polyline.
    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::closed_polyline(&[
            (x, y),
            (x + width, y),
            (x + width, y + height),
            (x, y + height),
        ])
    }

    /// Start and end point of an open primitive. Circles have none.
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        match self {
            Self::Line { start, end } => Some((*start, *end)),
            Self::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => Some((
                center.polar(*radius, *start_angle),
                center.polar(*radius, *end_angle),
            )),
            Self::Circle { .. } => None,
            Self::Polyline { vertices, .. } => {
                let first = vertices.first()?.point;
                let last = vertices.last()?.point;
                Some((first, last))
            }
        }
    }

    /// Whether the primitive encloses an area on its own.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match self {
            Self::Circle { .. } => true,
            Self::Polyline { vertices, closed } => {
                vertices.len() >= 3
                    && (*closed
                        || vertices
                            .first()
                            .zip(vertices.last())
                            .is_some_and(|(a, b)| a.point.approx_eq(&b.point, tolerance)))
            }
            Self::Line { .. } | Self::Arc { .. } => false,
        }
    }

    /// Approximates the primitive with points.
    ///
    /// Arcs yield `arc_segments` points from start to end, circles a closed
    /// ring without the repeated first point, and polylines their vertices
    /// with bulged segments expanded.
    pub fn to_points(&self, arc_segments: usize) -> Vec<Point> {
        match self {
            Self::Line { start, end } => vec![*start, *end],
            Self::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => arc_points(*center, *radius, *start_angle, *end_angle, arc_segments),
            Self::Circle { center, radius } => circle_points(*center, *radius, CIRCLE_SEGMENTS),
            Self::Polyline { vertices, closed } => {
                polyline_points(vertices, *closed, arc_segments)
            }
        }
    }

    /// Bounding box. Arcs and circles use their true extents.
    pub fn bounds(&self, arc_segments: usize) -> Option<Bounds> {
        match self {
            Self::Circle { center, radius } => Some(Bounds::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            )),
            Self::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let mut bounds = Bounds::from_points(&[
                    center.polar(*radius, *start_angle),
                    center.polar(*radius, *end_angle),
                ])?;
                for quadrant in [0.0, 90.0, 180.0, 270.0] {
                    if sweep_contains(*start_angle, *end_angle, quadrant) {
                        bounds.include(&center.polar(*radius, quadrant));
                    }
                }
                Some(bounds)
            }
            Self::Line { .. } | Self::Polyline { .. } => {
                Bounds::from_points(&self.to_points(arc_segments))
            }
        }
    }

    /// Moves the primitive by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> Geometry {
        self.map(|p| Point::new(p.x + dx, p.y + dy), 0.0)
    }

    /// Rotates the primitive counter-clockwise about `pivot`.
    pub fn rotate_about(&self, pivot: Point, turn: QuarterTurn) -> Geometry {
        self.map(|p| turn.rotate_point(p, pivot), turn.degrees() as f64)
    }

    /// Applies a rigid motion: `f` maps positions and `angle_delta` is its rotation.
    fn map<F>(&self, f: F, angle_delta: f64) -> Geometry
    where
        F: Fn(Point) -> Point,
    {
        match self {
            Self::Line { start, end } => Self::Line {
                start: f(*start),
                end: f(*end),
            },
            Self::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let sweep = arc_sweep(*start_angle, *end_angle);
                let start = (start_angle + angle_delta).rem_euclid(360.0);
                let mut end = start + sweep;
                if end >= 360.0 && sweep < 360.0 - EPSILON {
                    end -= 360.0;
                }
                Self::Arc {
                    center: f(*center),
                    radius: *radius,
                    start_angle: start,
                    end_angle: end,
                }
            }
            Self::Circle { center, radius } => Self::Circle {
                center: f(*center),
                radius: *radius,
            },
            Self::Polyline { vertices, closed } => Self::Polyline {
                vertices: vertices
                    .iter()
                    .map(|v| PolylineVertex {
                        point: f(v.point),
                        bulge: v.bulge,
                    })
                    .collect(),
                closed: *closed,
            },
        }
    }
}

/// Counter-clockwise sweep from `start` to `end` in degrees, in `(0, 360]`.
pub fn arc_sweep(start: f64, end: f64) -> f64 {
    let mut end = end;
    if end < start {
        end += 360.0;
    }
    let sweep = end - start;
    if sweep <= EPSILON {
        360.0
    } else {
        sweep
    }
}

/// Whether `angle` lies on the counter-clockwise sweep from `start` to `end`.
fn sweep_contains(start: f64, end: f64, angle: f64) -> bool {
    let offset = (angle - start).rem_euclid(360.0);
    offset <= arc_sweep(start, end)
}

/// `count` evenly spaced points from `start_angle` to `end_angle` inclusive.
pub fn arc_points(
    center: Point,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
    count: usize,
) -> Vec<Point> {
    let count = count.max(2);
    let mut end_angle = end_angle;
    if end_angle < start_angle {
        end_angle += 360.0;
    }
    let step = (end_angle - start_angle) / (count - 1) as f64;
    (0..count)
        .map(|i| center.polar(radius, start_angle + step * i as f64))
        .collect()
}

/// Ring of `count` points on a circle, first point not repeated.
pub fn circle_points(center: Point, radius: f64, count: usize) -> Vec<Point> {
    let count = count.max(3);
    (0..count)
        .map(|i| center.polar(radius, 360.0 * i as f64 / count as f64))
        .collect()
}

/// Points of the bulged segment from `from` to `to`, excluding `from`.
pub fn bulge_points(from: Point, to: Point, bulge: f64, count: usize) -> Vec<Point> {
    if bulge.abs() < EPSILON {
        return vec![to];
    }
    let (center, radius, start, sweep) = bulge_arc(from, to, bulge);
    let count = count.max(2);
    (1..count)
        .map(|i| {
            let angle = start + sweep * i as f64 / (count - 1) as f64;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Centre, radius, start angle and signed sweep (radians) of a bulged segment.
pub fn bulge_arc(from: Point, to: Point, bulge: f64) -> (Point, f64, f64, f64) {
    let chord = from.distance_to(&to);
    let sweep = 4.0 * bulge.atan();
    let mid = from.lerp(&to, 0.5);
    // Unit normal to the left of the chord
    let (nx, ny) = if chord > 0.0 {
        (-(to.y - from.y) / chord, (to.x - from.x) / chord)
    } else {
        (0.0, 0.0)
    };
    let offset = (1.0 - bulge * bulge) / (4.0 * bulge) * chord;
    let center = Point::new(mid.x + nx * offset, mid.y + ny * offset);
    let radius = center.distance_to(&from);
    let start = (from.y - center.y).atan2(from.x - center.x);
    (center, radius, start, sweep)
}

fn polyline_points(vertices: &[PolylineVertex], closed: bool, arc_segments: usize) -> Vec<Point> {
    let Some(first) = vertices.first() else {
        return Vec::new();
    };
    let mut points = vec![first.point];
    for pair in vertices.windows(2) {
        points.extend(bulge_points(pair[0].point, pair[1].point, pair[0].bulge, arc_segments));
    }
    if closed && vertices.len() > 1 {
        if let Some(last) = vertices.last() {
            if last.bulge.abs() >= EPSILON {
                let mut closing = bulge_points(last.point, first.point, last.bulge, arc_segments);
                // The closing point duplicates the first vertex.
                closing.pop();
                points.extend(closing);
            }
        }
    }
    points
}
