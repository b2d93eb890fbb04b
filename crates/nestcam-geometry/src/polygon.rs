//! Simple polygons and the predicates nesting and classification need.
//!
//! Rings are stored open: the first vertex is not repeated at the end.
//! Containment, intersection and distance are delegated to `geo`.

use geo::{Area, Contains, Distance, Euclidean, Intersects, LineString, Polygon as GeoPolygon};
use nestcam_core::constants::EPSILON;
use nestcam_core::{Bounds, Point};
use serde::{Deserialize, Serialize};

use crate::rotation::QuarterTurn;

/// A simple polygon given by its outer ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Builds a polygon, dropping consecutive duplicates and a repeated
    /// closing vertex.
    pub fn new(points: Vec<Point>) -> Self {
        let mut clean: Vec<Point> = Vec::with_capacity(points.len());
        for p in points {
            if clean.last().is_none_or(|last| !last.approx_eq(&p, EPSILON)) {
                clean.push(p);
            }
        }
        while clean.len() > 1
            && clean
                .first()
                .zip(clean.last())
                .is_some_and(|(a, b)| a.approx_eq(b, EPSILON))
        {
            clean.pop();
        }
        Self { points: clean }
    }

    pub fn from_tuples(points: &[(f64, f64)]) -> Self {
        Self::new(points.iter().map(|&p| Point::from(p)).collect())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// At least three vertices and a non-zero area.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3 && self.area() > EPSILON
    }

    /// Shoelace area, positive for counter-clockwise rings.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: f64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum();
        twice / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| self.points[i].distance_to(&self.points[(i + 1) % n]))
            .sum()
    }

    /// Same ring traversed the other way.
    pub fn reversed(&self) -> Polygon {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Same ring, counter-clockwise.
    pub fn to_ccw(&self) -> Polygon {
        if self.signed_area() < 0.0 {
            self.reversed()
        } else {
            self.clone()
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// Applies `f` to every vertex.
    pub fn map_points<F>(&self, f: F) -> Polygon
    where
        F: Fn(Point) -> Point,
    {
        Self {
            points: self.points.iter().map(|p| f(*p)).collect(),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Polygon {
        self.map_points(|p| Point::new(p.x + dx, p.y + dy))
    }

    pub fn rotate_about(&self, pivot: Point, turn: QuarterTurn) -> Polygon {
        self.map_points(|p| turn.rotate_point(p, pivot))
    }

    /// Converts to a `geo` polygon for the spatial predicates.
    pub fn to_geo(&self) -> GeoPolygon<f64> {
        let ring: Vec<(f64, f64)> = self.points.iter().map(|p| (p.x, p.y)).collect();
        GeoPolygon::new(LineString::from(ring), vec![])
    }

    /// Whether `other` lies strictly inside this polygon.
    pub fn contains(&self, other: &Polygon) -> bool {
        self.to_geo().contains(&other.to_geo())
    }
}

/// A polygon paired with its `geo` form and bounds, built once and queried often.
#[derive(Debug, Clone)]
pub struct PreparedPolygon {
    geo: GeoPolygon<f64>,
    bounds: Bounds,
}

impl PreparedPolygon {
    pub fn new(polygon: &Polygon) -> Option<Self> {
        Some(Self {
            geo: polygon.to_geo(),
            bounds: polygon.bounds()?,
        })
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn area(&self) -> f64 {
        self.geo.unsigned_area()
    }

    pub fn contains(&self, other: &PreparedPolygon) -> bool {
        self.bounds.contains_bounds(&other.bounds, EPSILON) && self.geo.contains(&other.geo)
    }

    /// Whether the two polygons touch, overlap, or come closer than `clearance`.
    pub fn conflicts_with(&self, other: &PreparedPolygon, clearance: f64) -> bool {
        if !self.bounds.expanded(clearance).overlaps(&other.bounds) {
            return false;
        }
        if self.geo.intersects(&other.geo) {
            return true;
        }
        clearance > 0.0 && self.distance_to(other) < clearance
    }

    /// Shortest distance between the two polygons, zero when they meet.
    pub fn distance_to(&self, other: &PreparedPolygon) -> f64 {
        Euclidean::distance(&self.geo, &other.geo)
    }
}
