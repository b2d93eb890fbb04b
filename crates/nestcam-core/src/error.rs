//! Configuration errors shared by the nesting and toolpath crates.
//!
//! A configuration error means the request cannot be satisfied at all,
//! for example a hole the tool physically cannot fit in. It is kept apart
//! from per-part outcomes such as a part that simply did not fit on the
//! sheet, which are reported as values rather than errors.

use thiserror::Error;

/// Errors raised when a request is impossible or meaningless as configured.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A round hole is smaller than the cutting tool.
    #[error("Hole radius {hole_radius:.3}mm is smaller than tool radius {tool_radius:.3}mm")]
    HoleSmallerThanTool {
        /// Radius of the hole to bore.
        hole_radius: f64,
        /// Radius of the tool.
        tool_radius: f64,
    },

    /// A non-round internal feature is too narrow for the tool.
    #[error("Feature '{feature}' is too narrow for a {tool_diameter:.3}mm tool")]
    FeatureTooNarrow {
        /// Description of the feature.
        feature: String,
        /// Diameter of the tool.
        tool_diameter: f64,
    },

    /// A parameter is outside its valid range.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Nothing usable was left to process.
    #[error("No valid parts to process")]
    NoValidParts,
}

impl ConfigurationError {
    /// Shorthand for [`ConfigurationError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for configuration checks.
pub type ConfigurationResult<T> = Result<T, ConfigurationError>;

/// Ensures `value` is finite and strictly positive.
pub fn require_positive(name: &str, value: f64) -> ConfigurationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(
            name,
            format!("must be positive, got {value}"),
        ))
    }
}

/// Ensures `value` is finite and not negative.
pub fn require_non_negative(name: &str, value: f64) -> ConfigurationResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(
            name,
            format!("must not be negative, got {value}"),
        ))
    }
}
