//! # NestCAM Nesting
//!
//! Places classified parts onto a rectangular sheet and writes the result
//! as a drawing.
//!
//! - **Transform**: the normalize, rotate, re-normalize, translate pipeline
//!   shared by collision checks and export
//! - **Nester**: bottom-left-fill placement with quarter-turn rotations
//! - **Export**: nested DXF with the sheet outline and every placed entity

pub mod error;
pub mod export;
pub mod nester;
pub mod part;
pub mod result;
pub mod transform;

pub use error::{NestResult, NestingError};
pub use export::{nested_drawing, write_nested_dxf, SHEET_LAYER};
pub use nester::Nester;
pub use part::NestPart;
pub use result::{NestingResult, Placement, PlacementFailure, UnfittedPart};
pub use transform::{PartTransform, Transformable};
