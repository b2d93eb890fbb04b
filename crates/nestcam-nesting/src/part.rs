//! Parts prepared for nesting.

use nestcam_geometry::{
    classify, read_drawing, Contour, ContourExtractor, Geometry, GeometryError, GeometryResult,
    Part, Polygon, PolylineVertex, SourceEntity,
};
use nestcam_settings::ExtractionSettings;
use std::path::Path;
use tracing::{debug, warn};

/// One input drawing: its original entities and the parts classified from them.
#[derive(Debug, Clone)]
pub struct NestPart {
    /// Source identifier, usually the file name.
    pub id: String,
    /// Entities replayed into the nested drawing.
    pub entities: Vec<SourceEntity>,
    /// Largest classified part. Its outer boundary is the collision polygon.
    pub part: Part,
    /// Further outer boundaries found in the same drawing.
    pub extra_parts: Vec<Part>,
}

impl NestPart {
    /// Builds a part from drawing entities.
    ///
    /// Fails with [`GeometryError::NoClosedContour`] when nothing closed
    /// is found; callers skip such drawings and report them.
    pub fn from_entities(
        id: impl Into<String>,
        entities: Vec<SourceEntity>,
        settings: &ExtractionSettings,
    ) -> GeometryResult<Self> {
        let id = id.into();
        let extraction = ContourExtractor::new(settings.clone()).extract(&entities);
        for warning in &extraction.warnings {
            warn!("{}: {}", id, warning);
        }

        let mut parts = classify(extraction.contours).into_iter();
        let Some(part) = parts.next() else {
            return Err(GeometryError::NoClosedContour(id));
        };
        let extra_parts: Vec<Part> = parts.collect();
        if !extra_parts.is_empty() {
            warn!(
                "{}: {} additional outer boundaries ride along with the largest one",
                id,
                extra_parts.len()
            );
        }
        debug!(
            "{}: part with {} holes, area {:.1}",
            id,
            part.holes.len(),
            part.area()
        );

        Ok(Self {
            id,
            entities,
            part,
            extra_parts,
        })
    }

    /// Reads and classifies a DXF file. The file name becomes the id.
    pub fn from_file(path: &Path, settings: &ExtractionSettings) -> GeometryResult<Self> {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let entities = read_drawing(path)?;
        Self::from_entities(id, entities, settings)
    }

    /// Builds a part from already classified geometry, synthesizing
    /// entities on layer `0` for export.
    pub fn from_part(id: impl Into<String>, part: Part) -> Self {
        let entities = std::iter::once(&part.outer)
            .chain(part.holes.iter())
            .map(|contour| SourceEntity::new("0", contour_geometry(contour)))
            .collect();
        Self {
            id: id.into(),
            entities,
            part,
            extra_parts: Vec::new(),
        }
    }

    /// Collision polygon in source coordinates.
    pub fn outline(&self) -> Polygon {
        self.part.outline()
    }

    /// True material area of the collision part.
    pub fn area(&self) -> f64 {
        self.part.area()
    }

    /// Every classified part of the drawing, largest first.
    pub fn all_parts(&self) -> impl Iterator<Item = &Part> {
        std::iter::once(&self.part).chain(self.extra_parts.iter())
    }
}

fn contour_geometry(contour: &Contour) -> Geometry {
    match contour {
        Contour::Circle { center, radius } => Geometry::Circle {
            center: *center,
            radius: *radius,
        },
        Contour::Polygon { polygon } => Geometry::Polyline {
            vertices: polygon
                .points()
                .iter()
                .map(|p| PolylineVertex::new(p.x, p.y))
                .collect(),
            closed: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestcam_core::Point;

    #[test]
    fn test_from_entities_picks_largest_part() {
        let part = NestPart::from_entities(
            "bracket.dxf",
            vec![
                SourceEntity::new("CUT", Geometry::rectangle(0.0, 0.0, 10.0, 10.0)),
                SourceEntity::new("CUT", Geometry::rectangle(20.0, 0.0, 80.0, 40.0)),
                SourceEntity::new(
                    "HOLES",
                    Geometry::Circle {
                        center: Point::new(40.0, 20.0),
                        radius: 5.0,
                    },
                ),
            ],
            &ExtractionSettings::default(),
        )
        .unwrap();
        assert_eq!(part.part.holes.len(), 1);
        assert_eq!(part.extra_parts.len(), 1);
        assert_eq!(part.all_parts().count(), 2);
        assert_eq!(part.entities.len(), 3);
    }

    #[test]
    fn test_no_closed_geometry_is_reported() {
        let err = NestPart::from_entities(
            "scribble.dxf",
            vec![SourceEntity::new("0", Geometry::line(0.0, 0.0, 5.0, 5.0))],
            &ExtractionSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::NoClosedContour(id) if id == "scribble.dxf"));
    }

    #[test]
    fn test_from_part_synthesizes_entities() {
        let mut part = Part::new(Contour::polygon(vec![
            Point::new(0.0, 0.0),
            Point::new(50.0, 0.0),
            Point::new(50.0, 50.0),
            Point::new(0.0, 50.0),
        ]));
        part.holes.push(Contour::circle(Point::new(25.0, 25.0), 5.0));
        let nest_part = NestPart::from_part("square", part);
        assert_eq!(nest_part.entities.len(), 2);
        assert!(matches!(
            nest_part.entities[1].geometry,
            Geometry::Circle { .. }
        ));
    }
}
