//! Cutting parameters shared by the contouring and boring generators.

use crate::error::CamToolResult;
use crate::multipass::DepthPlan;
use nestcam_core::error::{require_non_negative, require_positive};
use nestcam_settings::Config;
use serde::{Deserialize, Serialize};

/// Tool, feeds and heights for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutParameters {
    /// Diameter of the tool being used (mm)
    pub tool_diameter: f64,
    /// Feed rate for horizontal cutting (mm/min)
    pub feed_rate: f64,
    /// Feed rate for vertical movement (mm/min)
    pub plunge_rate: f64,
    /// Height for safe travel between features (mm)
    pub safety_height: f64,
    /// Depth of every pass
    pub depths: DepthPlan,
}

impl CutParameters {
    pub fn from_config(config: &Config) -> CamToolResult<Self> {
        require_positive("tool.diameter", config.tool.diameter)?;
        require_positive("material.feed_rate", config.material.feed_rate)?;
        require_positive("material.plunge_rate", config.material.plunge_rate)?;
        require_non_negative("cutting.safety_height", config.cutting.safety_height)?;
        let depths = DepthPlan::new(
            config.material.thickness,
            config.material.step_down,
            config.cutting.depth_strategy,
        )?;
        Ok(Self {
            tool_diameter: config.tool.diameter,
            feed_rate: config.material.feed_rate,
            plunge_rate: config.material.plunge_rate,
            safety_height: config.cutting.safety_height,
            depths,
        })
    }

    pub fn tool_radius(&self) -> f64 {
        self.tool_diameter / 2.0
    }
}
