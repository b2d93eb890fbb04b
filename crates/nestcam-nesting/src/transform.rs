//! The placement transform.
//!
//! A part is moved onto the sheet in four steps: normalize its outline to
//! the origin, rotate about the centre of the normalized bounding box,
//! normalize again, then translate to its sheet position. The collision
//! polygon and every exported entity go through [`PartTransform::apply`]
//! so the drawing always matches what was checked for collisions.

use nestcam_core::{Bounds, Point};
use nestcam_geometry::{Contour, Geometry, Part, Polygon, QuarterTurn};
use serde::{Deserialize, Serialize};

/// Anything that can be moved rigidly in the plane.
pub trait Transformable: Sized {
    fn translated(&self, dx: f64, dy: f64) -> Self;
    fn rotated(&self, pivot: Point, turn: QuarterTurn) -> Self;
}

impl Transformable for Point {
    fn translated(&self, dx: f64, dy: f64) -> Self {
        Point::new(self.x + dx, self.y + dy)
    }

    fn rotated(&self, pivot: Point, turn: QuarterTurn) -> Self {
        turn.rotate_point(*self, pivot)
    }
}

impl Transformable for Polygon {
    fn translated(&self, dx: f64, dy: f64) -> Self {
        self.translate(dx, dy)
    }

    fn rotated(&self, pivot: Point, turn: QuarterTurn) -> Self {
        self.rotate_about(pivot, turn)
    }
}

impl Transformable for Contour {
    fn translated(&self, dx: f64, dy: f64) -> Self {
        self.translate(dx, dy)
    }

    fn rotated(&self, pivot: Point, turn: QuarterTurn) -> Self {
        self.rotate_about(pivot, turn)
    }
}

impl Transformable for Geometry {
    fn translated(&self, dx: f64, dy: f64) -> Self {
        self.translate(dx, dy)
    }

    fn rotated(&self, pivot: Point, turn: QuarterTurn) -> Self {
        self.rotate_about(pivot, turn)
    }
}

impl Transformable for Part {
    fn translated(&self, dx: f64, dy: f64) -> Self {
        Part {
            outer: self.outer.translated(dx, dy),
            holes: self.holes.iter().map(|h| h.translated(dx, dy)).collect(),
        }
    }

    fn rotated(&self, pivot: Point, turn: QuarterTurn) -> Self {
        Part {
            outer: self.outer.rotated(pivot, turn),
            holes: self.holes.iter().map(|h| h.rotated(pivot, turn)).collect(),
        }
    }
}

/// Normalize, rotate, re-normalize and translate, with every parameter recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartTransform {
    /// Minimum corner of the source outline, moved to the origin first.
    pub origin: Point,
    /// Rotation centre: the centre of the normalized bounding box.
    pub pivot: Point,
    pub rotation: QuarterTurn,
    /// Minimum corner of the rotated outline, moved back to the origin.
    pub rotated_origin: Point,
    /// Final bottom-left corner on the sheet.
    pub position: Point,
    /// Size of the rotated bounding box.
    pub width: f64,
    pub height: f64,
}

impl PartTransform {
    /// Transform for an outline with the given bounds, placed at the origin.
    pub fn new(bounds: &Bounds, rotation: QuarterTurn) -> Self {
        let origin = bounds.min();
        let (w, h) = (bounds.width(), bounds.height());
        let pivot = Point::new(w / 2.0, h / 2.0);
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ]
        .map(|c| c.rotated(pivot, rotation));
        let rotated = Bounds::from_points(&corners).unwrap_or_else(|| Bounds::new(0.0, 0.0, w, h));

        Self {
            origin,
            pivot,
            rotation,
            rotated_origin: rotated.min(),
            position: Point::ORIGIN,
            width: rotated.width(),
            height: rotated.height(),
        }
    }

    /// Same transform with a different sheet position.
    pub fn at(&self, x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            ..*self
        }
    }

    /// Runs `item` through the placement pipeline.
    pub fn apply<T: Transformable>(&self, item: &T) -> T {
        item.translated(-self.origin.x, -self.origin.y)
            .rotated(self.pivot, self.rotation)
            .translated(-self.rotated_origin.x, -self.rotated_origin.y)
            .translated(self.position.x, self.position.y)
    }

    /// Placed bounding box.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width,
            self.position.y + self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn outline() -> Polygon {
        // 40 x 10 bar sitting away from the origin
        Polygon::from_tuples(&[(100.0, 50.0), (140.0, 50.0), (140.0, 60.0), (100.0, 60.0)])
    }

    #[test]
    fn test_identity_rotation_moves_to_position() {
        let t = PartTransform::new(&outline().bounds().unwrap(), QuarterTurn::Deg0).at(5.0, 7.0);
        let placed = t.apply(&outline());
        assert_eq!(placed.bounds().unwrap(), Bounds::new(5.0, 7.0, 45.0, 17.0));
        assert_eq!(t.bounds(), placed.bounds().unwrap());
    }

    #[test]
    fn test_quarter_turn_swaps_extent_and_lands_on_position() {
        let t = PartTransform::new(&outline().bounds().unwrap(), QuarterTurn::Deg90).at(20.0, 30.0);
        assert_relative_eq!(t.width, 10.0);
        assert_relative_eq!(t.height, 40.0);
        let b = t.apply(&outline()).bounds().unwrap();
        assert_relative_eq!(b.min_x, 20.0);
        assert_relative_eq!(b.min_y, 30.0);
        assert_relative_eq!(b.max_x, 30.0);
        assert_relative_eq!(b.max_y, 70.0);
    }

    #[test]
    fn test_points_and_entities_follow_the_outline() {
        let t = PartTransform::new(&outline().bounds().unwrap(), QuarterTurn::Deg270).at(3.0, 4.0);
        let corner = Point::new(140.0, 50.0);
        let polygon = t.apply(&outline());
        let line = t.apply(&Geometry::Line {
            start: corner,
            end: Point::new(100.0, 50.0),
        });
        let moved = t.apply(&corner);
        assert!(polygon.points().contains(&moved));
        match line {
            Geometry::Line { start, .. } => assert_eq!(start, moved),
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn test_circle_center_follows_rotation() {
        let t = PartTransform::new(&outline().bounds().unwrap(), QuarterTurn::Deg180);
        let hole = Contour::circle(Point::new(105.0, 55.0), 2.0);
        match t.apply(&hole) {
            Contour::Circle { center, radius } => {
                assert_relative_eq!(center.x, 35.0);
                assert_relative_eq!(center.y, 5.0);
                assert_relative_eq!(radius, 2.0);
            }
            other => panic!("expected circle, got {other:?}"),
        }
    }
}
