//! Per-part toolpath planning and part ordering.
//!
//! Parts are planned independently. A part whose features cannot be cut
//! with the configured tool is reported and left out of the program while
//! the rest of the sheet is still cut.

use crate::boring::BoringGenerator;
use crate::contouring::{ContourGenerator, ProfileSide};
use crate::error::CamToolResult;
use crate::params::CutParameters;
use crate::slotting::SlotGenerator;
use crate::toolpath::Toolpath;
use nestcam_core::Point;
use nestcam_geometry::{Contour, Part};
use nestcam_settings::Config;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// All toolpaths for one part, holes first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartToolpaths {
    pub id: String,
    pub toolpaths: Vec<Toolpath>,
}

impl PartToolpaths {
    pub fn start(&self) -> Option<Point> {
        self.toolpaths.iter().find_map(Toolpath::start)
    }

    pub fn end(&self) -> Option<Point> {
        self.toolpaths.iter().rev().find_map(Toolpath::end)
    }
}

/// A part that could not be planned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartFailure {
    pub id: String,
    pub reason: String,
}

/// Outcome of planning a sheet: cuttable parts in cutting order, and the
/// parts left out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolpathPlan {
    pub parts: Vec<PartToolpaths>,
    pub failures: Vec<PartFailure>,
}

/// Turns classified parts into ordered toolpaths.
#[derive(Debug, Clone)]
pub struct ToolpathPlanner {
    contours: ContourGenerator,
    boring: BoringGenerator,
    slots: Option<SlotGenerator>,
    optimize_order: bool,
}

impl ToolpathPlanner {
    pub fn from_config(config: &Config) -> CamToolResult<Self> {
        let params = CutParameters::from_config(config)?;
        Ok(Self {
            contours: ContourGenerator::new(params.clone(), config),
            slots: if config.slotting.enabled {
                Some(SlotGenerator::new(params.clone(), config)?)
            } else {
                None
            },
            boring: BoringGenerator::new(params, config)?,
            optimize_order: config.cutting.optimize_order,
        })
    }

    /// Toolpaths for one part: round holes are bored, elongated holes are
    /// cleared as slots, other holes are cut as inside profiles, and the
    /// outer boundary is cut last.
    pub fn plan_part(&self, id: &str, part: &Part) -> CamToolResult<PartToolpaths> {
        let mut toolpaths = Vec::with_capacity(part.holes.len() + 1);
        for (i, hole) in part.holes.iter().enumerate() {
            let label = format!("{} hole {}", id, i + 1);
            let toolpath = match hole {
                Contour::Circle { center, radius } => {
                    self.boring.generate(*center, *radius, &label)?
                }
                Contour::Polygon { polygon } => match &self.slots {
                    Some(slots) if slots.is_slot(polygon) => slots.generate(polygon, &label)?,
                    _ => self
                        .contours
                        .generate(polygon, ProfileSide::Inside, &label)?,
                },
            };
            toolpaths.push(toolpath);
        }
        let label = format!("{} outline", id);
        toolpaths.push(
            self.contours
                .generate(&part.outer.to_polygon(), ProfileSide::Outside, &label)?,
        );
        debug!("{}: {} toolpaths", id, toolpaths.len());
        Ok(PartToolpaths {
            id: id.to_string(),
            toolpaths,
        })
    }

    /// Plans every part and, when enabled, chains the planned ones
    /// nearest-neighbour. Parts that fail are collected, not propagated.
    pub fn plan(&self, parts: &[(String, Part)]) -> ToolpathPlan {
        let mut planned = Vec::with_capacity(parts.len());
        let mut failures = Vec::new();
        for (id, part) in parts {
            match self.plan_part(id, part) {
                Ok(toolpaths) => planned.push(toolpaths),
                Err(e) => {
                    warn!("Leaving {} out of the program: {}", id, e);
                    failures.push(PartFailure {
                        id: id.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        let parts = if self.optimize_order {
            order_nearest(planned)
        } else {
            planned
        };
        info!(
            "Planned toolpaths for {} parts, {} failed",
            parts.len(),
            failures.len()
        );
        ToolpathPlan { parts, failures }
    }
}

/// Greedy nearest-neighbour chaining from the end of one part to the start
/// of the next. The first part stays first; ties keep input order.
pub fn order_nearest(mut groups: Vec<PartToolpaths>) -> Vec<PartToolpaths> {
    if groups.len() < 3 {
        return groups;
    }
    let mut ordered = Vec::with_capacity(groups.len());
    ordered.push(groups.remove(0));
    while !groups.is_empty() {
        let cursor = ordered.last().and_then(PartToolpaths::end);
        let next = match cursor {
            Some(from) => groups
                .iter()
                .enumerate()
                .map(|(i, g)| {
                    let distance = g.start().map_or(f64::INFINITY, |s| s.distance_to(&from));
                    (i, distance)
                })
                .fold((0, f64::INFINITY), |best, (i, d)| if d < best.1 { (i, d) } else { best })
                .0,
            None => 0,
        };
        ordered.push(groups.remove(next));
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolpath::{Move, MovePurpose, MoveType, Position};

    fn marker(id: &str, x: f64) -> PartToolpaths {
        let mut toolpath = Toolpath::new(id);
        toolpath.push(Move::rapid(Position::new(x, 0.0, 5.0)));
        toolpath.push(Move::linear(Position::new(x, 0.0, -1.0), 100.0, MovePurpose::OutsideContour));
        PartToolpaths {
            id: id.to_string(),
            toolpaths: vec![toolpath],
        }
    }

    #[test]
    fn test_nearest_neighbour_keeps_first() {
        let groups = vec![
            marker("a", 0.0),
            marker("far", 500.0),
            marker("near", 10.0),
            marker("mid", 200.0),
        ];
        let ids: Vec<_> = order_nearest(groups).into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["a", "near", "mid", "far"]);
    }

    #[test]
    fn test_holes_before_outline() {
        let mut config = Config::default();
        config.material.thickness = 6.0;
        let mut part = Part::new(Contour::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 60.0),
            Point::new(0.0, 60.0),
        ]));
        part.holes.push(Contour::circle(Point::new(20.0, 30.0), 5.0));
        part.holes.push(Contour::polygon(vec![
            Point::new(50.0, 20.0),
            Point::new(80.0, 20.0),
            Point::new(80.0, 40.0),
            Point::new(50.0, 40.0),
        ]));

        let planner = ToolpathPlanner::from_config(&config).unwrap();
        let planned = planner.plan_part("plate", &part).unwrap();
        assert_eq!(planned.toolpaths.len(), 3);
        assert!(planned.toolpaths[0].count(MoveType::ArcCcw) > 0);
        assert!(planned.toolpaths[1]
            .moves
            .iter()
            .any(|m| m.purpose == MovePurpose::InsideContour));
        assert!(planned.toolpaths[1].moves.iter().all(|m| m.purpose != MovePurpose::Tab));
        assert_eq!(planned.toolpaths[2].label, "plate outline");
    }

    fn plate(hole_radius: f64) -> Part {
        let mut part = Part::new(Contour::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(80.0, 0.0),
            Point::new(80.0, 80.0),
            Point::new(0.0, 80.0),
        ]));
        part.holes.push(Contour::circle(Point::new(40.0, 40.0), hole_radius));
        part
    }

    #[test]
    fn test_failed_part_is_reported_not_fatal() {
        let planner = ToolpathPlanner::from_config(&Config::default()).unwrap();
        let parts = vec![
            ("good".to_string(), plate(10.0)),
            ("tiny hole".to_string(), plate(1.0)),
        ];
        let plan = planner.plan(&parts);
        assert_eq!(plan.parts.len(), 1);
        assert_eq!(plan.parts[0].id, "good");
        assert_eq!(plan.failures.len(), 1);
        assert_eq!(plan.failures[0].id, "tiny hole");
        assert!(plan.failures[0].reason.contains("smaller than"), "{}", plan.failures[0].reason);
    }

    #[test]
    fn test_elongated_hole_is_cleared_as_slot() {
        let mut part = plate(10.0);
        part.holes[0] = Contour::polygon(vec![
            Point::new(10.0, 35.0),
            Point::new(70.0, 35.0),
            Point::new(70.0, 45.0),
            Point::new(10.0, 45.0),
        ]);
        let mut config = Config::default();
        let planned = ToolpathPlanner::from_config(&config)
            .unwrap()
            .plan_part("plate", &part)
            .unwrap();
        assert!(planned.toolpaths[0].moves.iter().any(|m| m.purpose == MovePurpose::Slot));

        config.slotting.enabled = false;
        let planned = ToolpathPlanner::from_config(&config)
            .unwrap()
            .plan_part("plate", &part)
            .unwrap();
        assert!(planned.toolpaths[0]
            .moves
            .iter()
            .all(|m| m.purpose != MovePurpose::Slot));
    }
}
