//! DXF reading and writing.
//!
//! Only the planar primitives a part outline can be drawn with are read:
//! LINE, ARC, CIRCLE, LWPOLYLINE and POLYLINE. Anything else (text,
//! dimensions, hatches, block references) is skipped.

use crate::entity::{Geometry, PolylineVertex, SourceEntity};
use crate::error::{GeometryError, GeometryResult};
use dxf::entities::{Arc, Circle, Entity, EntityType, Line, LwPolyline};
use dxf::enums::AcadVersion;
use dxf::{Color, Drawing, LwPolylineVertex};
use nestcam_core::Point;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Reads every supported entity from a DXF file.
pub fn read_drawing(path: &Path) -> GeometryResult<Vec<SourceEntity>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let drawing = Drawing::load(&mut reader).map_err(|e| GeometryError::Dxf {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let entities = entities_from_drawing(&drawing);
    info!("Read {} entities from {}", entities.len(), path.display());
    Ok(entities)
}

/// Converts the entities section of a loaded drawing.
pub fn entities_from_drawing(drawing: &Drawing) -> Vec<SourceEntity> {
    let mut entities = Vec::new();
    let mut skipped = 0usize;
    for entity in drawing.entities() {
        match geometry_from_entity(&entity.specific) {
            Some(geometry) => {
                entities.push(SourceEntity::new(entity.common.layer.clone(), geometry))
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("Skipped {} unsupported or empty entities", skipped);
    }
    entities
}

fn geometry_from_entity(specific: &EntityType) -> Option<Geometry> {
    match specific {
        EntityType::Line(line) => Some(Geometry::Line {
            start: Point::new(line.p1.x, line.p1.y),
            end: Point::new(line.p2.x, line.p2.y),
        }),
        EntityType::Arc(arc) => Some(Geometry::Arc {
            center: Point::new(arc.center.x, arc.center.y),
            radius: arc.radius,
            start_angle: arc.start_angle,
            end_angle: arc.end_angle,
        }),
        EntityType::Circle(circle) => Some(Geometry::Circle {
            center: Point::new(circle.center.x, circle.center.y),
            radius: circle.radius,
        }),
        EntityType::LwPolyline(polyline) => {
            if polyline.vertices.is_empty() {
                return None;
            }
            Some(Geometry::Polyline {
                vertices: polyline
                    .vertices
                    .iter()
                    .map(|v| PolylineVertex::with_bulge(v.x, v.y, v.bulge))
                    .collect(),
                // Bit 0 marks a closed polyline
                closed: polyline.flags & 1 != 0,
            })
        }
        EntityType::Polyline(polyline) => {
            let vertices: Vec<PolylineVertex> = polyline
                .vertices()
                .map(|v| PolylineVertex::with_bulge(v.location.x, v.location.y, v.bulge))
                .collect();
            if vertices.is_empty() {
                return None;
            }
            Some(Geometry::Polyline {
                vertices,
                closed: polyline.flags & 1 != 0,
            })
        }
        _ => None,
    }
}

/// Builds a DXF entity for `geometry` on `layer` with an ACI colour index.
///
/// Polylines are always written as LWPOLYLINE, keeping their bulges.
pub fn to_dxf_entity(geometry: &Geometry, layer: &str, color: u8) -> Entity {
    let specific = match geometry {
        Geometry::Line { start, end } => EntityType::Line(Line::new(
            dxf::Point::new(start.x, start.y, 0.0),
            dxf::Point::new(end.x, end.y, 0.0),
        )),
        Geometry::Arc {
            center,
            radius,
            start_angle,
            end_angle,
        } => EntityType::Arc(Arc::new(
            dxf::Point::new(center.x, center.y, 0.0),
            *radius,
            *start_angle,
            *end_angle,
        )),
        Geometry::Circle { center, radius } => EntityType::Circle(Circle::new(
            dxf::Point::new(center.x, center.y, 0.0),
            *radius,
        )),
        Geometry::Polyline { vertices, closed } => {
            let mut polyline = LwPolyline::default();
            for v in vertices {
                polyline.vertices.push(LwPolylineVertex {
                    x: v.point.x,
                    y: v.point.y,
                    bulge: v.bulge,
                    ..Default::default()
                });
            }
            polyline.set_is_closed(*closed);
            EntityType::LwPolyline(polyline)
        }
    };

    let mut entity = Entity::new(specific);
    entity.common.layer = layer.to_string();
    entity.common.color = Color::from_index(color);
    entity
}

/// A fresh R2010 drawing, the version most CAM packages import cleanly.
pub fn new_drawing() -> Drawing {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2010;
    drawing
}

/// Writes `drawing` to `path`.
pub fn save_drawing(drawing: &Drawing, path: &Path) -> GeometryResult<()> {
    drawing
        .save_file(&*path.to_string_lossy())
        .map_err(|e| GeometryError::Dxf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    info!("Wrote DXF {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_entity_conversion_keeps_layer_and_shape() {
        let mut drawing = new_drawing();
        drawing.add_entity(to_dxf_entity(
            &Geometry::rectangle(0.0, 0.0, 40.0, 20.0),
            "CUT",
            2,
        ));
        drawing.add_entity(to_dxf_entity(
            &Geometry::Arc {
                center: Point::new(5.0, 5.0),
                radius: 2.0,
                start_angle: 10.0,
                end_angle: 100.0,
            },
            "ARCS",
            3,
        ));

        let entities = entities_from_drawing(&drawing);
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].layer, "CUT");
        assert_eq!(entities[0].geometry, Geometry::rectangle(0.0, 0.0, 40.0, 20.0));
        match &entities[1].geometry {
            Geometry::Arc {
                radius,
                start_angle,
                end_angle,
                ..
            } => {
                assert_relative_eq!(*radius, 2.0);
                assert_relative_eq!(*start_angle, 10.0);
                assert_relative_eq!(*end_angle, 100.0);
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn test_bulges_survive_conversion() {
        let geometry = Geometry::Polyline {
            vertices: vec![
                PolylineVertex::with_bulge(0.0, 0.0, 1.0),
                PolylineVertex::new(10.0, 0.0),
            ],
            closed: true,
        };
        let entity = to_dxf_entity(&geometry, "0", 7);
        assert_eq!(geometry_from_entity(&entity.specific), Some(geometry));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_drawing(Path::new("/nonexistent/part.dxf")).unwrap_err();
        assert!(matches!(err, GeometryError::Io(_)));
    }
}
