//! # NestCAM
//!
//! Nests 2D part drawings onto a sheet and generates CNC toolpaths for the
//! result.
//!
//! ## Architecture
//!
//! NestCAM is organized as a workspace with multiple crates:
//!
//! 1. **nestcam-core** - Planar value types, tolerances, configuration errors
//! 2. **nestcam-settings** - Configuration, validation, material presets
//! 3. **nestcam-geometry** - DXF entities, contour extraction, part classification
//! 4. **nestcam-nesting** - Bottom-left-fill nesting and nested DXF export
//! 5. **nestcam-camtools** - Toolpaths, tabs, boring and the Mach3 post-processor
//! 6. **nestcam** - The job facade and command line interface
//!
//! ## Pipeline
//!
//! - **Extract**: closed contours from lines, arcs, circles and polylines
//! - **Classify**: outer boundaries and their holes
//! - **Nest**: quarter-turn rotations, grid search from the sheet origin
//! - **Export**: the nested drawing with the sheet outline
//! - **Post**: compensated multi-pass profiles with tabs and optional lead
//!   arcs, bored holes and cleared slots, written as Mach3 G-code

pub mod job;

pub use job::{Job, JobInput, JobReport, SkippedInput};

pub use nestcam_camtools::{
    BoringGenerator, CamToolError, ContourGenerator, GcodeOutput, Move, MovePurpose, MoveType,
    PartFailure, PartToolpaths, PostProcessor, ProgramStats, SlotGenerator, Toolpath,
    ToolpathPlan, ToolpathPlanner,
};
pub use nestcam_core::{Bounds, ConfigurationError, MeasurementSystem, Point};
pub use nestcam_geometry::{Contour, Geometry, GeometryError, Part, Polygon, SourceEntity};
pub use nestcam_nesting::{
    nested_drawing, write_nested_dxf, NestPart, Nester, NestingError, NestingResult, Placement,
    PlacementFailure,
};
pub use nestcam_settings::{Config, MaterialPreset, SettingsError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging on stderr with:
/// - RUST_LOG environment variable support, `info` by default
/// - Target, level and line number on every event
/// - JSON lines instead of text when `json` is set
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(fmt_layer.json())
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;
    } else {
        registry
            .with(fmt_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to install logger: {e}"))?;
    }

    Ok(())
}
