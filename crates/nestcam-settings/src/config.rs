//! Configuration for NestCAM
//!
//! Provides configuration file handling, defaults and validation.
//! Supports JSON and TOML file formats stored in a platform-specific directory.
//!
//! Configuration is organized into logical sections:
//! - Nesting (sheet size, spacing, rotation candidates)
//! - Tool and material (diameter, feeds, speeds, thickness, step-down)
//! - Cutting strategy (heights, direction, finish pass, ordering)
//! - Holding tabs, boring and slot clearing
//! - Post-processor output and drawing extraction tolerances

use crate::error::{SettingsError, SettingsResult};
use nestcam_core::constants;
use nestcam_core::error::{require_non_negative, require_positive};
use nestcam_core::MeasurementSystem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Sheet and placement settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NestingSettings {
    /// Sheet width in mm
    pub sheet_width: f64,
    /// Sheet height in mm
    pub sheet_height: f64,
    /// Minimum gap between placed parts in mm
    pub spacing: f64,
    /// Candidate rotations in degrees, tried in order
    pub rotations: Vec<u32>,
    /// Smallest grid step of the position search in mm
    pub min_grid_step: f64,
    /// The grid step is the part's smaller side divided by this
    pub grid_divisions: u32,
}

impl Default for NestingSettings {
    fn default() -> Self {
        Self {
            sheet_width: 1000.0,
            sheet_height: 500.0,
            spacing: 2.0,
            rotations: vec![0, 90, 180, 270],
            min_grid_step: 1.0,
            grid_divisions: 10,
        }
    }
}

/// Cutting tool settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolSettings {
    /// Tool diameter in mm
    pub diameter: f64,
    /// Number of flutes
    pub flutes: u32,
    /// Tool number used for the tool change
    pub number: u32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            diameter: 3.175,
            flutes: 2,
            number: 1,
        }
    }
}

impl ToolSettings {
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }
}

/// Stock material settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaterialSettings {
    /// Display name
    pub name: String,
    /// Stock thickness in mm
    pub thickness: f64,
    /// Cutting feed rate in mm/min
    pub feed_rate: f64,
    /// Plunge feed rate in mm/min
    pub plunge_rate: f64,
    /// Spindle speed in RPM
    pub spindle_speed: u32,
    /// Maximum depth per pass in mm
    pub step_down: f64,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            name: "plywood".to_string(),
            thickness: 12.0,
            feed_rate: 1000.0,
            plunge_rate: 300.0,
            spindle_speed: 18000,
            step_down: 3.0,
        }
    }
}

/// Cutting direction relative to spindle rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutDirection {
    /// Climb milling
    #[default]
    Climb,
    /// Conventional milling
    Conventional,
}

impl fmt::Display for CutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Climb => write!(f, "climb"),
            Self::Conventional => write!(f, "conventional"),
        }
    }
}

/// How total depth is split into passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepthStrategy {
    /// Full step-down per pass, remainder on the last pass
    #[default]
    MaxStep,
    /// Equal depth per pass
    Constant,
}

/// Cutting strategy settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CuttingSettings {
    /// Height for rapid moves between cuts in mm
    pub safety_height: f64,
    /// Height the tool retracts to at program end in mm
    pub clearance_height: f64,
    /// Milling direction
    pub direction: CutDirection,
    /// Rough at an allowance and finish at full offset
    pub finish_pass: bool,
    /// Stock left by the roughing passes in mm
    pub finish_allowance: f64,
    /// Maximum chord deviation when flattening arcs in mm
    pub arc_tolerance: f64,
    /// Chain parts nearest-neighbour to reduce travel
    pub optimize_order: bool,
    /// Depth pass distribution
    pub depth_strategy: DepthStrategy,
    /// Enter and leave outside profiles along tangent arcs
    pub lead_in_out: bool,
    /// Radius of the lead arcs in mm
    pub lead_radius: f64,
}

impl Default for CuttingSettings {
    fn default() -> Self {
        Self {
            safety_height: 5.0,
            clearance_height: 25.0,
            direction: CutDirection::Climb,
            finish_pass: false,
            finish_allowance: 0.1,
            arc_tolerance: 0.1,
            optimize_order: true,
            depth_strategy: DepthStrategy::MaxStep,
            lead_in_out: false,
            lead_radius: 3.0,
        }
    }
}

/// Holding tab settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TabSettings {
    /// Whether tabs are generated
    pub enabled: bool,
    /// Material left under a tab in mm
    pub height: f64,
    /// Tab length along the contour in mm
    pub width: f64,
    /// Maximum distance between tabs in mm
    pub max_spacing: f64,
    /// Minimum tabs per part
    pub min_per_part: u32,
    /// Tabs keep at least this distance from corners in mm
    pub corner_exclusion: f64,
    /// Direction change in degrees above which a vertex is a corner
    pub corner_angle_threshold: f64,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            height: 3.0,
            width: 8.0,
            max_spacing: 100.0,
            min_per_part: 2,
            corner_exclusion: 10.0,
            corner_angle_threshold: 45.0,
        }
    }
}

/// Round hole boring settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoringSettings {
    /// Depth per helix revolution in mm
    pub helix_pitch: f64,
    /// Retract to safety height between plunge passes
    pub peck: bool,
}

impl Default for BoringSettings {
    fn default() -> Self {
        Self {
            helix_pitch: 0.5,
            peck: false,
        }
    }
}

/// Slot clearing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SlottingSettings {
    /// Clear elongated holes completely instead of cutting their outline
    pub enabled: bool,
    /// Length to width ratio from which a hole is treated as a slot
    pub min_aspect_ratio: f64,
    /// Distance between clearing rings as a fraction of the tool diameter
    pub stepover: f64,
    /// Ramp length along the path per mm of depth
    pub ramp_ratio: f64,
}

impl Default for SlottingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_aspect_ratio: 3.0,
            stepover: 0.75,
            ramp_ratio: 3.0,
        }
    }
}

/// Post-processor output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PostSettings {
    /// Program name written in the header
    pub program_name: String,
    /// Units announced to the controller
    pub units: MeasurementSystem,
    /// Turn flood coolant on
    pub coolant: bool,
    /// Prefix lines with N-numbers
    pub line_numbers: bool,
    /// Decimal places for coordinates
    pub decimals: usize,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            program_name: "NESTCAM".to_string(),
            units: MeasurementSystem::Metric,
            coolant: false,
            line_numbers: false,
            decimals: 3,
        }
    }
}

/// Drawing extraction tolerances
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Endpoint matching distance while tracing in mm
    pub connect_tolerance: f64,
    /// Distance at which a traced loop counts as closed in mm
    pub close_tolerance: f64,
    /// Maximum segments in one traced loop
    pub max_trace_segments: usize,
    /// Smallest accepted polygon area in mm²
    pub min_polygon_area: f64,
    /// Points per interpolated arc
    pub arc_segments: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            connect_tolerance: constants::CONNECT_TOLERANCE,
            close_tolerance: constants::CLOSE_TOLERANCE,
            max_trace_segments: constants::MAX_TRACE_SEGMENTS,
            min_polygon_area: constants::MIN_POLYGON_AREA,
            arc_segments: constants::ARC_SEGMENTS,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub nesting: NestingSettings,
    pub tool: ToolSettings,
    pub material: MaterialSettings,
    pub cutting: CuttingSettings,
    pub tabs: TabSettings,
    pub boring: BoringSettings,
    pub slotting: SlottingSettings,
    pub post: PostSettings,
    pub extraction: ExtractionSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the user config file
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("nestcam").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(e.to_string()))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let n = &self.nesting;
        require_positive("nesting.sheet_width", n.sheet_width)?;
        require_positive("nesting.sheet_height", n.sheet_height)?;
        require_non_negative("nesting.spacing", n.spacing)?;
        require_positive("nesting.min_grid_step", n.min_grid_step)?;
        if n.grid_divisions == 0 {
            return Err(SettingsError::invalid("nesting.grid_divisions", "must be > 0"));
        }
        if n.rotations.is_empty() {
            return Err(SettingsError::invalid("nesting.rotations", "must not be empty"));
        }
        if let Some(bad) = n.rotations.iter().find(|r| **r % 90 != 0 || **r >= 360) {
            return Err(SettingsError::invalid(
                "nesting.rotations",
                format!("{} is not one of 0, 90, 180, 270", bad),
            ));
        }

        require_positive("tool.diameter", self.tool.diameter)?;
        if self.tool.flutes == 0 {
            return Err(SettingsError::invalid("tool.flutes", "must be > 0"));
        }

        let m = &self.material;
        require_positive("material.thickness", m.thickness)?;
        require_positive("material.feed_rate", m.feed_rate)?;
        require_positive("material.plunge_rate", m.plunge_rate)?;
        require_positive("material.step_down", m.step_down)?;
        if m.spindle_speed == 0 {
            return Err(SettingsError::invalid("material.spindle_speed", "must be > 0"));
        }

        let c = &self.cutting;
        require_positive("cutting.safety_height", c.safety_height)?;
        if c.clearance_height < c.safety_height {
            return Err(SettingsError::invalid(
                "cutting.clearance_height",
                "must not be below the safety height",
            ));
        }
        require_non_negative("cutting.finish_allowance", c.finish_allowance)?;
        require_positive("cutting.arc_tolerance", c.arc_tolerance)?;
        if c.lead_in_out {
            require_positive("cutting.lead_radius", c.lead_radius)?;
        }

        let t = &self.tabs;
        require_non_negative("tabs.height", t.height)?;
        require_non_negative("tabs.width", t.width)?;
        require_positive("tabs.max_spacing", t.max_spacing)?;
        require_non_negative("tabs.corner_exclusion", t.corner_exclusion)?;
        if !(0.0..=180.0).contains(&t.corner_angle_threshold) {
            return Err(SettingsError::invalid(
                "tabs.corner_angle_threshold",
                "must be within 0..180 degrees",
            ));
        }
        if t.enabled && t.height >= m.thickness {
            return Err(SettingsError::invalid(
                "tabs.height",
                "must be less than the material thickness",
            ));
        }

        require_positive("boring.helix_pitch", self.boring.helix_pitch)?;

        let sl = &self.slotting;
        if !sl.min_aspect_ratio.is_finite() || sl.min_aspect_ratio < 1.0 {
            return Err(SettingsError::invalid("slotting.min_aspect_ratio", "must be >= 1"));
        }
        if !sl.stepover.is_finite() || sl.stepover <= 0.0 || sl.stepover > 1.0 {
            return Err(SettingsError::invalid("slotting.stepover", "must be within (0, 1]"));
        }
        require_positive("slotting.ramp_ratio", sl.ramp_ratio)?;

        if self.post.decimals == 0 || self.post.decimals > 6 {
            return Err(SettingsError::invalid("post.decimals", "must be within 1..=6"));
        }

        let e = &self.extraction;
        require_positive("extraction.connect_tolerance", e.connect_tolerance)?;
        if e.close_tolerance < e.connect_tolerance {
            return Err(SettingsError::invalid(
                "extraction.close_tolerance",
                "must not be below the connect tolerance",
            ));
        }
        if e.max_trace_segments < 2 {
            return Err(SettingsError::invalid("extraction.max_trace_segments", "must be >= 2"));
        }
        require_non_negative("extraction.min_polygon_area", e.min_polygon_area)?;
        if e.arc_segments < 2 {
            return Err(SettingsError::invalid("extraction.arc_segments", "must be >= 2"));
        }

        Ok(())
    }
}

/// Supported config file formats
enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.nesting.spacing, 2.0);
        assert_eq!(config.tabs.width, 8.0);
        assert_eq!(config.tabs.min_per_part, 2);
        assert_eq!(config.tool.diameter, 3.175);
    }

    #[test]
    fn test_rejects_bad_rotation() {
        let mut config = Config::default();
        config.nesting.rotations = vec![0, 45];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("nesting.rotations"));
    }

    #[test]
    fn test_rejects_tab_taller_than_stock() {
        let mut config = Config::default();
        config.tabs.height = 12.0;
        assert!(config.validate().is_err());

        config.tabs.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_slot_stepover_wider_than_tool() {
        let mut config = Config::default();
        config.slotting.stepover = 1.5;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("slotting.stepover"));
    }

    #[test]
    fn test_lead_radius_checked_only_when_enabled() {
        let mut config = Config::default();
        config.cutting.lead_radius = 0.0;
        assert!(config.validate().is_ok());
        config.cutting.lead_in_out = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_spacing() {
        let mut config = Config::default();
        config.nesting.spacing = -1.0;
        assert!(matches!(
            config.validate(),
            Err(SettingsError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [nesting]
            sheet_width = 1200.0

            [cutting]
            direction = "conventional"
            "#,
        )
        .unwrap();
        assert_eq!(config.nesting.sheet_width, 1200.0);
        assert_eq!(config.nesting.sheet_height, 500.0);
        assert_eq!(config.cutting.direction, CutDirection::Conventional);
        assert_eq!(config.material, MaterialSettings::default());
    }

    #[test]
    fn test_default_path_is_toml_under_app_dir() {
        if let Ok(path) = Config::default_path() {
            assert!(path.ends_with(Path::new("nestcam").join("config.toml")));
            assert!(matches!(Format::of(&path), Ok(Format::Toml)));
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let result = Config::default().save_to_file(Path::new("config.yaml"));
        assert!(matches!(result, Err(SettingsError::UnsupportedFormat(_))));
    }
}
