//! # NestCAM Core
//!
//! Core types and shared utilities for NestCAM.
//! Provides the planar value types used by every stage of the pipeline,
//! the numeric tolerances they agree on, and the configuration error
//! shared by the nesting and toolpath crates.

pub mod constants;
pub mod error;
pub mod types;
pub mod units;

pub use error::{ConfigurationError, ConfigurationResult};
pub use types::{Bounds, Point};
pub use units::MeasurementSystem;
