//! Contour extraction from drawing entities.
//!
//! Closed polylines and circles are taken as they are. Lines, arcs and open
//! polylines are chained end to end into loops. When chaining yields no
//! loop at all, the loose line work is handed to [`polygonize`].

use crate::contour::Contour;
use crate::entity::{Geometry, SourceEntity};
use crate::error::GeometryError;
use crate::polygon::Polygon;
use crate::polygonize::polygonize;
use nestcam_core::constants::EPSILON;
use nestcam_core::Point;
use nestcam_settings::ExtractionSettings;
use tracing::{debug, info};

/// Contours found in a drawing plus the problems met on the way.
#[derive(Debug, Default)]
pub struct Extraction {
    pub contours: Vec<Contour>,
    /// Non-fatal issues such as loops that never closed.
    pub warnings: Vec<GeometryError>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }
}

/// An open chain of points taken from a line, arc or open polyline.
#[derive(Debug, Clone)]
struct Segment {
    points: Vec<Point>,
}

impl Segment {
    fn start(&self) -> Point {
        self.points[0]
    }

    fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }
}

/// Turns drawing entities into closed contours.
#[derive(Debug, Clone, Default)]
pub struct ContourExtractor {
    settings: ExtractionSettings,
}

impl ContourExtractor {
    pub fn new(settings: ExtractionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Extracts every closed contour.
    ///
    /// A drawing without closed geometry gives an empty list, not an error.
    pub fn extract(&self, entities: &[SourceEntity]) -> Extraction {
        let s = &self.settings;
        let mut extraction = Extraction::default();
        let mut segments = Vec::new();

        for entity in entities {
            match &entity.geometry {
                Geometry::Circle { center, radius } => {
                    if *radius > EPSILON {
                        extraction.contours.push(Contour::circle(*center, *radius));
                    }
                }
                geometry @ Geometry::Polyline { .. } if geometry.is_closed(EPSILON) => {
                    let polygon = Polygon::new(geometry.to_points(s.arc_segments));
                    if polygon.is_valid() {
                        extraction.contours.push(Contour::Polygon { polygon });
                    } else {
                        extraction.warnings.push(GeometryError::DegeneratePolygon(format!(
                            "closed polyline on layer '{}' has {} distinct vertices",
                            entity.layer,
                            polygon.len()
                        )));
                    }
                }
                geometry @ (Geometry::Line { .. }
                | Geometry::Arc { .. }
                | Geometry::Polyline { .. }) => {
                    let points = geometry.to_points(s.arc_segments);
                    if points.len() >= 2 {
                        segments.push(Segment { points });
                    }
                }
            }
        }
        let explicit = extraction.contours.len();

        let traced = self.trace_loops(&segments, &mut extraction.warnings);
        let traced_count = traced.len();
        if traced.is_empty() && !segments.is_empty() {
            info!(
                "Tracing closed no loops from {} segments, polygonizing",
                segments.len()
            );
            let lines: Vec<Vec<Point>> = segments.into_iter().map(|seg| seg.points).collect();
            extraction.contours.extend(
                polygonize(&lines, s.connect_tolerance, s.min_polygon_area)
                    .into_iter()
                    .map(|polygon| Contour::Polygon { polygon }),
            );
        } else {
            extraction.contours.extend(traced);
        }

        debug!(
            "Extracted {} contours ({} explicit, {} traced)",
            extraction.contours.len(),
            explicit,
            traced_count
        );
        extraction
    }

    /// Chains segments end to end into closed loops.
    fn trace_loops(&self, segments: &[Segment], warnings: &mut Vec<GeometryError>) -> Vec<Contour> {
        let s = &self.settings;
        let mut used = vec![false; segments.len()];
        let mut contours = Vec::new();

        for first in 0..segments.len() {
            if used[first] {
                continue;
            }
            used[first] = true;
            let mut taken = vec![first];
            let mut chain = segments[first].points.clone();
            let start = segments[first].start();

            let closed = loop {
                let current = chain[chain.len() - 1];
                if chain.len() >= 3 && current.approx_eq(&start, s.connect_tolerance) {
                    break true;
                }
                if taken.len() >= s.max_trace_segments {
                    break false;
                }
                match next_segment(segments, &used, current, s.connect_tolerance) {
                    Some((index, reversed)) => {
                        used[index] = true;
                        taken.push(index);
                        let points = &segments[index].points;
                        if reversed {
                            chain.extend(points.iter().rev().skip(1));
                        } else {
                            chain.extend(points.iter().skip(1));
                        }
                    }
                    None => {
                        break chain.len() >= 3 && current.approx_eq(&start, s.close_tolerance)
                    }
                }
            };

            if closed {
                chain.pop();
                let polygon = Polygon::new(chain);
                if polygon.is_valid() {
                    contours.push(Contour::Polygon { polygon });
                } else {
                    warnings.push(GeometryError::DegeneratePolygon(format!(
                        "traced loop at ({:.3}, {:.3}) has no area",
                        start.x, start.y
                    )));
                }
            } else {
                debug!(
                    "Loop from ({:.3}, {:.3}) did not close after {} segments",
                    start.x,
                    start.y,
                    taken.len()
                );
                warnings.push(GeometryError::UnclosedLoop {
                    x: start.x,
                    y: start.y,
                    segments: taken.len(),
                });
                for index in taken {
                    used[index] = false;
                }
            }
        }

        contours
    }
}

/// First unused segment touching `at`, and whether it must be walked backwards.
fn next_segment(
    segments: &[Segment],
    used: &[bool],
    at: Point,
    tolerance: f64,
) -> Option<(usize, bool)> {
    segments
        .iter()
        .enumerate()
        .filter(|(index, _)| !used[*index])
        .find_map(|(index, segment)| {
            if segment.start().approx_eq(&at, tolerance) {
                Some((index, false))
            } else if segment.end().approx_eq(&at, tolerance) {
                Some((index, true))
            } else {
                None
            }
        })
}
