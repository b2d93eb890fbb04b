//! # NestCAM Geometry
//!
//! Turns part drawings into classified geometry.
//!
//! - **Entities**: the tagged [`Geometry`] model read from DXF
//! - **Extraction**: closed contours from explicit shapes, traced loops or
//!   polygonized line work
//! - **Classification**: outer boundaries and the holes inside them
//! - **Polygons**: area, orientation and the spatial predicates nesting needs

pub mod classifier;
pub mod contour;
pub mod dxf_io;
pub mod entity;
pub mod error;
pub mod extractor;
pub mod polygon;
pub mod polygonize;
pub mod rotation;

pub use classifier::{classify, Part};
pub use contour::Contour;
pub use dxf_io::{entities_from_drawing, new_drawing, read_drawing, save_drawing, to_dxf_entity};
pub use entity::{Geometry, PolylineVertex, SourceEntity};
pub use error::{GeometryError, GeometryResult};
pub use extractor::{ContourExtractor, Extraction};
pub use polygon::{Polygon, PreparedPolygon};
pub use rotation::QuarterTurn;
