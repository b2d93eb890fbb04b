//! Arclength addressing along a closed cutting path.

use nestcam_core::constants::EPSILON;
use nestcam_core::Point;
use nestcam_geometry::Polygon;

/// A closed ring of points with cumulative edge lengths.
#[derive(Debug, Clone)]
pub struct ClosedPath {
    points: Vec<Point>,
    /// `cumulative[i]` is the distance from the first point to point `i`;
    /// the extra last entry is the full length.
    cumulative: Vec<f64>,
}

impl ClosedPath {
    pub fn new(polygon: &Polygon) -> Self {
        let points = polygon.points().to_vec();
        let n = points.len();
        let mut cumulative = Vec::with_capacity(n + 1);
        let mut total = 0.0;
        cumulative.push(0.0);
        for i in 0..n {
            total += points[i].distance_to(&points[(i + 1) % n]);
            cumulative.push(total);
        }
        Self { points, cumulative }
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

    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Distance along the path from the start to vertex `i`.
    pub fn vertex_distance(&self, i: usize) -> f64 {
        self.cumulative[i]
    }

    /// Wraps `s` into `[0, length)`.
    pub fn wrap(&self, s: f64) -> f64 {
        let length = self.length();
        if length <= 0.0 {
            0.0
        } else {
            s.rem_euclid(length)
        }
    }

    /// Shortest distance between two arclength positions around the loop.
    pub fn circular_distance(&self, a: f64, b: f64) -> f64 {
        let d = self.wrap(a - b);
        d.min(self.length() - d)
    }

    /// Unit direction of travel on the edge leaving arclength `s`.
    pub fn tangent_at(&self, s: f64) -> Point {
        let n = self.points.len();
        if n < 2 {
            return Point::new(1.0, 0.0);
        }
        let edge = self.edge_at(self.wrap(s));
        let d = self.points[(edge + 1) % n] - self.points[edge];
        let length = d.x.hypot(d.y);
        if length <= 0.0 {
            Point::new(1.0, 0.0)
        } else {
            Point::new(d.x / length, d.y / length)
        }
    }

    /// Unit direction of travel on the edge arriving at arclength `s`.
    pub fn tangent_before(&self, s: f64) -> Point {
        let n = self.points.len();
        if n < 2 {
            return Point::new(1.0, 0.0);
        }
        let s = self.wrap(s);
        let edge = match self.edge_at(s) {
            e if s - self.cumulative[e] > EPSILON => e,
            0 => n - 1,
            e => e - 1,
        };
        let d = self.points[(edge + 1) % n] - self.points[edge];
        let length = d.x.hypot(d.y);
        if length <= 0.0 {
            Point::new(1.0, 0.0)
        } else {
            Point::new(d.x / length, d.y / length)
        }
    }

    /// Points passed walking forward `distance` from arclength `from`: each
    /// vertex on the way and the end point, with their distance from `from`.
    pub fn span(&self, from: f64, distance: f64) -> Vec<(f64, Point)> {
        let length = self.length();
        let mut out = Vec::new();
        if length <= 0.0 || distance <= 0.0 {
            return out;
        }
        let from = self.wrap(from);
        let laps = ((from + distance) / length).ceil() as usize;
        for lap in 0..=laps {
            for i in 0..self.points.len() {
                let d = self.cumulative[i] + lap as f64 * length - from;
                if d > EPSILON && d < distance - EPSILON {
                    out.push((d, self.points[i]));
                }
            }
        }
        out.sort_by(|a, b| a.0.total_cmp(&b.0));
        out.push((distance, self.point_at(from + distance)));
        out
    }

    /// Index of the edge containing the wrapped arclength `s`.
    fn edge_at(&self, s: f64) -> usize {
        let n = self.points.len();
        match self.cumulative.partition_point(|&c| c <= s) {
            0 => 0,
            k => (k - 1).min(n.saturating_sub(1)),
        }
    }

    /// Point at arclength `s`, wrapping around the loop.
    pub fn point_at(&self, s: f64) -> Point {
        let Some(&first) = self.points.first() else {
            return Point::ORIGIN;
        };
        let s = self.wrap(s);
        let n = self.points.len();
        let edge = self.edge_at(s);
        let a = self.points[edge];
        let b = if n > 1 { self.points[(edge + 1) % n] } else { first };
        let edge_length = self.cumulative[edge + 1] - self.cumulative[edge];
        if edge_length <= 0.0 {
            return a;
        }
        a.lerp(&b, (s - self.cumulative[edge]) / edge_length)
    }
}
