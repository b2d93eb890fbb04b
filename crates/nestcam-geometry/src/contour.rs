//! Closed contours extracted from a drawing.

use crate::entity::{circle_points, CIRCLE_SEGMENTS};
use crate::polygon::Polygon;
use crate::rotation::QuarterTurn;
use nestcam_core::{Bounds, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A closed boundary. Circles stay exact so round holes can be bored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Contour {
    Circle { center: Point, radius: f64 },
    Polygon { polygon: Polygon },
}

impl Contour {
    pub fn circle(center: Point, radius: f64) -> Self {
        Self::Circle { center, radius }
    }

    pub fn polygon(points: Vec<Point>) -> Self {
        Self::Polygon {
            polygon: Polygon::new(points),
        }
    }

    /// Polygonal form used for area, containment and offsetting.
    pub fn to_polygon(&self) -> Polygon {
        match self {
            Self::Circle { center, radius } => {
                Polygon::new(circle_points(*center, *radius, CIRCLE_SEGMENTS))
            }
            Self::Polygon { polygon } => polygon.clone(),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Self::Circle { radius, .. } => PI * radius * radius,
            Self::Polygon { polygon } => polygon.area(),
        }
    }

    pub fn perimeter(&self) -> f64 {
        match self {
            Self::Circle { radius, .. } => 2.0 * PI * radius,
            Self::Polygon { polygon } => polygon.perimeter(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            Self::Circle { center, radius } => Some(Bounds::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            )),
            Self::Polygon { polygon } => polygon.bounds(),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Contour {
        match self {
            Self::Circle { center, radius } => Self::Circle {
                center: Point::new(center.x + dx, center.y + dy),
                radius: *radius,
            },
            Self::Polygon { polygon } => Self::Polygon {
                polygon: polygon.translate(dx, dy),
            },
        }
    }

    pub fn rotate_about(&self, pivot: Point, turn: QuarterTurn) -> Contour {
        match self {
            Self::Circle { center, radius } => Self::Circle {
                center: turn.rotate_point(*center, pivot),
                radius: *radius,
            },
            Self::Polygon { polygon } => Self::Polygon {
                polygon: polygon.rotate_about(pivot, turn),
            },
        }
    }
}
