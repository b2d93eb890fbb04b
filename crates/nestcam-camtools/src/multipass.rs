//! Multiple pass depth control.
//!
//! The material thickness is cut in passes no deeper than the configured
//! step-down. The last pass always lands exactly on the target depth.

use nestcam_core::constants::EPSILON;
use nestcam_core::error::require_positive;
use nestcam_core::ConfigurationResult;
use nestcam_settings::DepthStrategy;
use serde::{Deserialize, Serialize};

/// Depths of every pass, as positive distances below the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthPlan {
    depths: Vec<f64>,
}

impl DepthPlan {
    /// Splits `total_depth` into passes of at most `max_step`.
    pub fn new(
        total_depth: f64,
        max_step: f64,
        strategy: DepthStrategy,
    ) -> ConfigurationResult<Self> {
        require_positive("material.thickness", total_depth)?;
        require_positive("material.step_down", max_step)?;

        let passes = pass_count(total_depth, max_step);
        let mut depths: Vec<f64> = (1..=passes)
            .map(|i| match strategy {
                DepthStrategy::MaxStep => (max_step * i as f64).min(total_depth),
                DepthStrategy::Constant => total_depth * i as f64 / passes as f64,
            })
            .collect();
        if let Some(last) = depths.last_mut() {
            *last = total_depth;
        }
        Ok(Self { depths })
    }

    pub fn passes(&self) -> usize {
        self.depths.len()
    }

    pub fn depths(&self) -> &[f64] {
        &self.depths
    }

    pub fn final_depth(&self) -> f64 {
        self.depths.last().copied().unwrap_or(0.0)
    }

    /// Z values of every pass (negative, surface at zero).
    pub fn z_levels(&self) -> impl Iterator<Item = f64> + '_ {
        self.depths.iter().map(|d| -d)
    }
}

/// `ceil(total / step)`, tolerant of totals that are an exact multiple.
pub fn pass_count(total_depth: f64, max_step: f64) -> usize {
    ((total_depth / max_step - EPSILON).ceil()).max(1.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_step_last_pass_is_short() {
        let plan = DepthPlan::new(10.0, 3.0, DepthStrategy::MaxStep).unwrap();
        assert_eq!(plan.depths(), &[3.0, 6.0, 9.0, 10.0]);
    }

    #[test]
    fn test_constant_strategy_splits_evenly() {
        let plan = DepthPlan::new(10.0, 3.0, DepthStrategy::Constant).unwrap();
        assert_eq!(plan.passes(), 4);
        assert_eq!(plan.depths()[0], 2.5);
        assert_eq!(plan.final_depth(), 10.0);
    }

    #[test]
    fn test_exact_multiple_has_no_extra_pass() {
        let plan = DepthPlan::new(12.0, 3.0, DepthStrategy::MaxStep).unwrap();
        assert_eq!(plan.passes(), 4);
        let plan = DepthPlan::new(0.3, 0.1, DepthStrategy::MaxStep).unwrap();
        assert_eq!(plan.passes(), 3);
        assert_eq!(plan.final_depth(), 0.3);
    }

    #[test]
    fn test_step_larger_than_thickness_is_one_pass() {
        let plan = DepthPlan::new(2.0, 5.0, DepthStrategy::MaxStep).unwrap();
        assert_eq!(plan.depths(), &[2.0]);
        assert_eq!(plan.z_levels().collect::<Vec<_>>(), vec![-2.0]);
    }

    #[test]
    fn test_zero_step_is_rejected() {
        assert!(DepthPlan::new(10.0, 0.0, DepthStrategy::MaxStep).is_err());
    }
}
