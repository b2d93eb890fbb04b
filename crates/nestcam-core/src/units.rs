//! Unit handling
//!
//! Geometry is always carried in millimetres. The measurement system only
//! affects what the post-processor announces to the controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    /// Metric system (mm)
    #[default]
    Metric,
    /// Imperial system (inches)
    Imperial,
}

impl MeasurementSystem {
    /// G-code word selecting this unit system.
    pub fn gcode_word(&self) -> &'static str {
        match self {
            Self::Metric => "G21",
            Self::Imperial => "G20",
        }
    }

    /// Short unit label ("mm" or "in").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Metric => "mm",
            Self::Imperial => "in",
        }
    }

    /// Converts a millimetre value into this system.
    pub fn from_mm(&self, value_mm: f64) -> f64 {
        match self {
            Self::Metric => value_mm,
            Self::Imperial => value_mm / 25.4,
        }
    }
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "Metric"),
            Self::Imperial => write!(f, "Imperial"),
        }
    }
}

impl FromStr for MeasurementSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "mm" => Ok(Self::Metric),
            "imperial" | "inch" | "in" => Ok(Self::Imperial),
            _ => Err(format!("Unknown measurement system: {}", s)),
        }
    }
}
