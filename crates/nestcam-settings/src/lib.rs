//! NestCAM Settings Crate
//!
//! Handles application configuration, validation and material presets.

pub mod config;
pub mod error;
pub mod materials;

pub use config::{
    BoringSettings, Config, CutDirection, CuttingSettings, DepthStrategy, ExtractionSettings,
    MaterialSettings, NestingSettings, PostSettings, SlottingSettings, TabSettings, ToolSettings,
};
pub use error::{SettingsError, SettingsResult};
pub use materials::MaterialPreset;
