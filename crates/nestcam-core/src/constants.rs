//! Numeric tolerances shared across the workspace.
//!
//! All lengths are millimetres.

/// Two coordinates closer than this are treated as the same point.
pub const EPSILON: f64 = 1e-6;

/// Default distance within which two segment endpoints are joined while tracing.
pub const CONNECT_TOLERANCE: f64 = 0.1;

/// Default distance within which a traced loop is considered closed.
pub const CLOSE_TOLERANCE: f64 = 0.5;

/// Default cap on the number of segments a single traced loop may use.
pub const MAX_TRACE_SEGMENTS: usize = 200;

/// Polygons at or below this area (mm²) are discarded as noise.
pub const MIN_POLYGON_AREA: f64 = 10.0;

/// Default number of points used to approximate an arc.
pub const ARC_SEGMENTS: usize = 20;
