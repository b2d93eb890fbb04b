//! Error types for nesting.

use nestcam_core::ConfigurationError;
use nestcam_geometry::GeometryError;
use thiserror::Error;

/// Errors that abort a whole nesting run.
///
/// A part that does not fit is not an error; it ends up in
/// [`crate::NestingResult::unfitted`].
#[derive(Error, Debug)]
pub enum NestingError {
    /// The request cannot be satisfied as configured.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Reading a part drawing or writing the nested drawing failed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// The results summary could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for nesting operations.
pub type NestResult<T> = Result<T, NestingError>;
