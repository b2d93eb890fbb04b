//! Part classification.
//!
//! Contours are split into outer boundaries ("parts") and the contours
//! nested inside them ("holes") by testing containment in order of
//! decreasing area.

use crate::contour::Contour;
use crate::polygon::{Polygon, PreparedPolygon};
use nestcam_core::Bounds;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

/// An outer boundary with the holes it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub outer: Contour,
    pub holes: Vec<Contour>,
}

impl Part {
    pub fn new(outer: Contour) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Polygon of the outer boundary, used for collision checks.
    pub fn outline(&self) -> Polygon {
        self.outer.to_polygon()
    }

    /// Material area: the outer boundary minus its holes.
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(Contour::area).sum();
        (self.outer.area() - holes).max(0.0)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.outer.bounds()
    }
}

/// Groups contours into parts.
///
/// Polygons are visited largest first (stable for equal areas). A polygon
/// contained in an earlier one becomes a hole of the part that owns that
/// earlier polygon, otherwise it starts a new part. Degenerate contours are
/// dropped.
pub fn classify(contours: Vec<Contour>) -> Vec<Part> {
    let mut entries: Vec<(Contour, PreparedPolygon, f64)> = contours
        .into_iter()
        .filter_map(|contour| {
            let polygon = contour.to_polygon();
            if !polygon.is_valid() {
                debug!("Dropping degenerate contour with {} vertices", polygon.len());
                return None;
            }
            let prepared = PreparedPolygon::new(&polygon)?;
            let area = contour.area();
            Some((contour, prepared, area))
        })
        .collect();

    entries.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap_or(Ordering::Equal));

    let mut parts: Vec<Part> = Vec::new();
    // Index of the owning part for each processed entry.
    let mut owner: Vec<usize> = Vec::with_capacity(entries.len());

    for i in 0..entries.len() {
        let parent = (0..i).find(|&j| entries[j].1.contains(&entries[i].1));
        match parent {
            Some(j) => {
                let part_index = owner[j];
                parts[part_index].holes.push(entries[i].0.clone());
                owner.push(part_index);
            }
            None => {
                parts.push(Part::new(entries[i].0.clone()));
                owner.push(parts.len() - 1);
            }
        }
    }

    debug!(
        "Classified {} contours into {} parts",
        entries.len(),
        parts.len()
    );
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestcam_core::Point;

    fn rect(x: f64, y: f64, w: f64, h: f64) -> Contour {
        Contour::polygon(vec![
            Point::new(x, y),
            Point::new(x + w, y),
            Point::new(x + w, y + h),
            Point::new(x, y + h),
        ])
    }

    #[test]
    fn test_hole_attaches_to_container() {
        let parts = classify(vec![
            Contour::circle(Point::new(20.0, 20.0), 3.0),
            rect(0.0, 0.0, 100.0, 50.0),
            rect(60.0, 10.0, 20.0, 20.0),
        ]);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].holes.len(), 2);
        assert_eq!(parts[0].outer, rect(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn test_disjoint_contours_are_separate_parts() {
        let parts = classify(vec![rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 15.0, 10.0)]);
        assert_eq!(parts.len(), 2);
        // Largest first
        assert_eq!(parts[0].outer, rect(20.0, 0.0, 15.0, 10.0));
        assert!(parts.iter().all(|p| p.holes.is_empty()));
    }

    #[test]
    fn test_island_in_hole_goes_to_outer_part() {
        let parts = classify(vec![
            rect(0.0, 0.0, 100.0, 100.0),
            rect(10.0, 10.0, 50.0, 50.0),
            rect(20.0, 20.0, 10.0, 10.0),
        ]);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].holes.len(), 2);
    }

    #[test]
    fn test_equal_areas_keep_input_order() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(50.0, 0.0, 10.0, 10.0);
        let parts = classify(vec![a.clone(), b.clone()]);
        assert_eq!(parts[0].outer, a);
        assert_eq!(parts[1].outer, b);
    }

    #[test]
    fn test_part_area_subtracts_holes() {
        let parts = classify(vec![rect(0.0, 0.0, 10.0, 10.0), rect(2.0, 2.0, 2.0, 2.0)]);
        assert!((parts[0].area() - 96.0).abs() < 1e-9);
    }
}
