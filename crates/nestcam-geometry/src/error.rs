//! Error types for drawing import and contour extraction.
//!
//! Geometry errors are per-file: callers skip the offending drawing and
//! report it rather than aborting a batch.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or interpreting a drawing.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// The DXF file could not be parsed.
    #[error("DXF parse error in {path}: {message}")]
    Dxf { path: PathBuf, message: String },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The drawing holds no closed contour.
    #[error("No closed contour found in {0}")]
    NoClosedContour(String),

    /// A traced chain of segments did not close into a loop.
    #[error("Could not close contour starting at ({x:.3}, {y:.3}) after {segments} segments")]
    UnclosedLoop { x: f64, y: f64, segments: usize },

    /// A polygon has too few distinct vertices or no area.
    #[error("Degenerate polygon: {0}")]
    DegeneratePolygon(String),
}

/// Result type alias for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;
