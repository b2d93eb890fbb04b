//! # NestCAM CAM Tools
//!
//! Turns placed parts into cutting moves and Mach3 G-code.
//!
//! ## Toolpaths
//!
//! - **Contouring**: tool-compensated profiles cut in depth passes, with an
//!   optional finish pass
//! - **Tabs**: holding bridges on the final pass, kept clear of corners
//! - **Lead-in/out**: optional tangential arcs onto outside profiles
//! - **Boring**: straight plunges or helical interpolation for round holes
//! - **Slotting**: elongated holes cleared with stepover rings and a ramped entry
//! - **Planning**: holes before outlines, parts chained nearest-neighbour,
//!   failing parts reported without stopping the rest
//!
//! ## Output
//!
//! - **Post-processor**: modal Mach3 G-code with program statistics

pub mod boring;
pub mod contouring;
pub mod error;
pub mod multipass;
pub mod offset;
pub mod params;
pub mod path;
pub mod planner;
pub mod postprocessor;
pub mod slotting;
pub mod tabs;
pub mod toolpath;

pub use boring::BoringGenerator;
pub use contouring::{ContourGenerator, ProfileSide};
pub use error::{CamToolError, CamToolResult};
pub use multipass::{pass_count, DepthPlan};
pub use offset::offset_polygon;
pub use params::CutParameters;
pub use path::ClosedPath;
pub use planner::{order_nearest, PartFailure, PartToolpaths, ToolpathPlan, ToolpathPlanner};
pub use postprocessor::{GcodeOutput, PostProcessor, ProgramStats, RAPID_RATE};
pub use slotting::{elongation, SlotGenerator};
pub use tabs::{Tab, TabPlanner};
pub use toolpath::{Move, MovePurpose, MoveType, Position, Toolpath};
