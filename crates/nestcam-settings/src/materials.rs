//! Built-in material presets.
//!
//! A preset bundles stock thickness, feeds and speeds with the tab geometry
//! that holds that material reliably. Applying a preset overwrites the
//! corresponding sections of a [`Config`].

use crate::config::Config;
use crate::error::{SettingsError, SettingsResult};
use serde::Serialize;

/// Feeds, speeds and tab geometry for one stock material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialPreset {
    pub key: &'static str,
    pub display_name: &'static str,
    pub thickness: f64,
    pub feed_rate: f64,
    pub plunge_rate: f64,
    pub spindle_speed: u32,
    pub step_down: f64,
    /// Chip load per tooth in mm
    pub chip_load: f64,
    pub coolant: bool,
    pub finish_pass: bool,
    pub finish_allowance: f64,
    pub tab_width: f64,
    pub tab_height: f64,
    pub min_tabs: u32,
    pub tab_spacing: f64,
}

const PRESETS: &[MaterialPreset] = &[
    MaterialPreset {
        key: "plywood_12mm",
        display_name: "Plywood 12mm",
        thickness: 12.0,
        feed_rate: 1000.0,
        plunge_rate: 300.0,
        spindle_speed: 18000,
        step_down: 3.0,
        chip_load: 0.1,
        coolant: false,
        finish_pass: false,
        finish_allowance: 0.1,
        tab_width: 8.0,
        tab_height: 3.0,
        min_tabs: 2,
        tab_spacing: 100.0,
    },
    MaterialPreset {
        key: "mdf_18mm",
        display_name: "MDF 18mm",
        thickness: 18.0,
        feed_rate: 800.0,
        plunge_rate: 250.0,
        spindle_speed: 16000,
        step_down: 4.0,
        chip_load: 0.1,
        coolant: false,
        finish_pass: false,
        finish_allowance: 0.1,
        tab_width: 8.0,
        tab_height: 3.0,
        min_tabs: 2,
        tab_spacing: 100.0,
    },
    MaterialPreset {
        key: "aluminum_6mm",
        display_name: "Aluminum (6061/5052) 6mm",
        thickness: 6.0,
        feed_rate: 300.0,
        plunge_rate: 100.0,
        spindle_speed: 10000,
        step_down: 0.5,
        chip_load: 0.05,
        coolant: true,
        finish_pass: true,
        finish_allowance: 0.1,
        tab_width: 4.0,
        tab_height: 1.5,
        min_tabs: 3,
        tab_spacing: 150.0,
    },
    MaterialPreset {
        key: "galvanized_steel_3mm",
        display_name: "Galvanized Steel 3mm",
        thickness: 3.0,
        feed_rate: 1000.0,
        plunge_rate: 250.0,
        spindle_speed: 24000,
        step_down: 1.5,
        chip_load: 0.03,
        coolant: true,
        finish_pass: true,
        finish_allowance: 0.15,
        tab_width: 5.0,
        tab_height: 2.0,
        min_tabs: 4,
        tab_spacing: 120.0,
    },
];

impl MaterialPreset {
    /// All built-in presets.
    pub fn all() -> &'static [MaterialPreset] {
        PRESETS
    }

    /// Looks a preset up by key, ignoring case and treating spaces as underscores.
    pub fn find(name: &str) -> SettingsResult<&'static MaterialPreset> {
        let key = name.trim().to_lowercase().replace(' ', "_");
        PRESETS
            .iter()
            .find(|p| p.key == key)
            .ok_or_else(|| SettingsError::UnknownPreset(name.to_string()))
    }

    /// Feed rate from chip load (`rpm × flutes × chip_load`), capped at the
    /// preset's recommended feed.
    pub fn feed_for(&self, spindle_speed: u32, flutes: u32) -> f64 {
        let calculated = spindle_speed as f64 * flutes as f64 * self.chip_load;
        calculated.min(self.feed_rate)
    }

    /// Writes this preset into `config`.
    pub fn apply_to(&self, config: &mut Config) {
        let m = &mut config.material;
        m.name = self.key.to_string();
        m.thickness = self.thickness;
        m.feed_rate = self.feed_for(self.spindle_speed, config.tool.flutes);
        m.plunge_rate = self.plunge_rate;
        m.spindle_speed = self.spindle_speed;
        m.step_down = self.step_down;

        config.cutting.finish_pass = self.finish_pass;
        config.cutting.finish_allowance = self.finish_allowance;
        config.post.coolant = self.coolant;

        let t = &mut config.tabs;
        t.width = self.tab_width;
        t.height = self.tab_height;
        t.min_per_part = self.min_tabs;
        t.max_spacing = self.tab_spacing;

        tracing::info!("Applied material preset '{}'", self.display_name);
    }
}
