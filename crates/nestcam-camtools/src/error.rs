//! Error types for the CAM tools crate.
//!
//! Toolpath generation fails only for configuration problems (a tool that
//! cannot physically cut a feature, invalid parameters) or when the offset
//! kernel gives up on a degenerate contour.

use nestcam_core::ConfigurationError;
use std::{fmt, io};
use thiserror::Error;

/// Errors that can occur during toolpath generation and post-processing.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// The request cannot be satisfied with the configured tool or parameters.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Tool compensation of a contour failed.
    #[error("Offset failed: {0}")]
    OffsetFailed(String),

    /// G-code text could not be assembled.
    #[error("G-code generation failed: {0}")]
    GenerationFailed(String),

    /// Formatting into the output buffer failed.
    #[error("Formatting error: {0}")]
    Format(#[from] fmt::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;
