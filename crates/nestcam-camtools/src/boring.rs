//! Round hole boring.
//!
//! A hole the same size as the tool is plunged straight down, one plunge
//! per depth pass, optionally retracting between passes to clear chips.
//! A larger hole is cut by helical interpolation at radius
//! `hole - tool`, descending exactly `helix_pitch` per revolution through
//! the full thickness, with a flat cleanup circle at the bottom before
//! returning to the centre.

use crate::contouring::ProfileSide;
use crate::error::CamToolResult;
use crate::params::CutParameters;
use crate::toolpath::{Move, MovePurpose, Position, Toolpath};
use nestcam_core::constants::EPSILON;
use nestcam_core::error::require_positive;
use nestcam_core::{ConfigurationError, Point};
use nestcam_settings::{Config, CutDirection};
use std::f64::consts::PI;
use tracing::debug;

/// Generator for round hole toolpaths.
#[derive(Debug, Clone)]
pub struct BoringGenerator {
    params: CutParameters,
    helix_pitch: f64,
    peck: bool,
    direction: CutDirection,
}

impl BoringGenerator {
    pub fn new(params: CutParameters, config: &Config) -> CamToolResult<Self> {
        require_positive("boring.helix_pitch", config.boring.helix_pitch)?;
        Ok(Self {
            params,
            helix_pitch: config.boring.helix_pitch,
            peck: config.boring.peck,
            direction: config.cutting.direction,
        })
    }

    pub fn from_config(config: &Config) -> CamToolResult<Self> {
        Self::new(CutParameters::from_config(config)?, config)
    }

    /// Toolpath for a hole of `radius` centred on `center`.
    pub fn generate(&self, center: Point, radius: f64, label: &str) -> CamToolResult<Toolpath> {
        let tool_radius = self.params.tool_radius();
        if radius < tool_radius - EPSILON {
            return Err(ConfigurationError::HoleSmallerThanTool {
                hole_radius: radius,
                tool_radius,
            }
            .into());
        }

        let mut toolpath = Toolpath::new(label);
        if (radius - tool_radius).abs() <= EPSILON {
            self.plunge(&mut toolpath, center);
        } else {
            self.helical(&mut toolpath, center, radius - tool_radius);
        }
        Ok(toolpath)
    }

    fn plunge(&self, toolpath: &mut Toolpath, center: Point) {
        let safety = self.params.safety_height;
        let depths = self.params.depths.depths();
        toolpath.push(Move::rapid(Position::at(center, safety)));
        for (i, depth) in depths.iter().enumerate() {
            toolpath.push(Move::plunge(
                Position::at(center, -depth),
                self.params.plunge_rate,
                MovePurpose::Boring,
            ));
            if self.peck && i + 1 < depths.len() {
                toolpath.push(Move::retract(Position::at(center, safety)));
            }
        }
        toolpath.push(Move::retract(Position::at(center, safety)));
    }

    fn helical(&self, toolpath: &mut Toolpath, center: Point, helix_radius: f64) {
        let safety = self.params.safety_height;
        let feed = self.params.feed_rate;
        let final_depth = self.params.depths.final_depth();
        let clockwise = ProfileSide::Inside.clockwise(self.direction);
        let start = Point::new(center.x + helix_radius, center.y);

        toolpath.push(Move::rapid(Position::at(start, safety)));
        toolpath.push(Move::plunge(
            Position::at(start, 0.0),
            self.params.plunge_rate,
            MovePurpose::Boring,
        ));

        // Whole turns at the configured pitch, then a partial turn for the rest
        let turns = ((final_depth / self.helix_pitch) + EPSILON).floor() as usize;
        for k in 1..=turns {
            let depth = (self.helix_pitch * k as f64).min(final_depth);
            toolpath.push(Move::arc(
                clockwise,
                Position::at(start, -depth),
                center,
                feed,
                MovePurpose::Boring,
            ));
        }
        let remainder = final_depth - self.helix_pitch * turns as f64;
        let mut end = start;
        if remainder > EPSILON {
            let sweep = 2.0 * PI * remainder / self.helix_pitch;
            let angle = if clockwise { -sweep } else { sweep };
            end = Point::new(
                center.x + helix_radius * angle.cos(),
                center.y + helix_radius * angle.sin(),
            );
            toolpath.push(Move::arc(
                clockwise,
                Position::at(end, -final_depth),
                center,
                feed,
                MovePurpose::Boring,
            ));
        }

        // Flat cleanup circle at the bottom
        toolpath.push(Move::arc(
            clockwise,
            Position::at(end, -final_depth),
            center,
            feed,
            MovePurpose::Boring,
        ));
        toolpath.push(Move::linear(
            Position::at(center, -final_depth),
            feed,
            MovePurpose::Boring,
        ));
        toolpath.push(Move::retract(Position::at(center, safety)));
        debug!(
            "Helical bore r={:.3} at ({:.3}, {:.3}): {:.2} revolutions at {:.3}mm pitch",
            helix_radius,
            center.x,
            center.y,
            final_depth / self.helix_pitch,
            self.helix_pitch
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CamToolError;
    use crate::toolpath::MoveType;
    use approx::assert_relative_eq;

    fn config(tool_diameter: f64) -> Config {
        let mut config = Config::default();
        config.tool.diameter = tool_diameter;
        config.material.thickness = 5.0;
        config.material.step_down = 2.0;
        config
    }

    #[test]
    fn test_tool_sized_hole_plunges_once_per_pass() {
        let generator = BoringGenerator::from_config(&config(6.0)).unwrap();
        let path = generator
            .generate(Point::new(10.0, 20.0), 3.0, "hole")
            .unwrap();
        assert_eq!(path.count(MoveType::Plunge), 3);
        assert_eq!(path.count(MoveType::ArcCw) + path.count(MoveType::ArcCcw), 0);
        assert_eq!(path.min_z(), Some(-5.0));
    }

    #[test]
    fn test_peck_retracts_between_passes() {
        let mut config = config(6.0);
        config.boring.peck = true;
        let generator = BoringGenerator::from_config(&config).unwrap();
        let path = generator.generate(Point::ORIGIN, 3.0, "hole").unwrap();
        assert_eq!(path.count(MoveType::Retract), 3);
    }

    #[test]
    fn test_helix_pitch_and_cleanup() {
        let mut config = config(6.0);
        config.boring.helix_pitch = 1.0;
        let generator = BoringGenerator::from_config(&config).unwrap();
        let path = generator.generate(Point::ORIGIN, 5.0, "hole").unwrap();

        // 5mm at 1mm per turn plus the cleanup circle
        assert_eq!(path.count(MoveType::ArcCcw), 6);
        let arcs: Vec<_> = path.moves.iter().filter(|m| m.kind.is_arc()).collect();
        assert_eq!(arcs[0].target, Position::new(2.0, 0.0, -1.0));
        assert_eq!(arcs[5].target, Position::new(2.0, 0.0, -5.0));
        assert_eq!(arcs[0].center, Some(Point::ORIGIN));

        let back = &path.moves[path.moves.len() - 2];
        assert_eq!(back.target, Position::new(0.0, 0.0, -5.0));
    }

    #[test]
    fn test_helix_keeps_pitch_through_partial_turn() {
        let mut config = config(6.0);
        config.boring.helix_pitch = 2.0;
        let generator = BoringGenerator::from_config(&config).unwrap();
        let path = generator.generate(Point::ORIGIN, 5.0, "hole").unwrap();

        // Two whole turns to 4mm, half a turn for the last 1mm, cleanup circle
        let arcs: Vec<_> = path.moves.iter().filter(|m| m.kind.is_arc()).collect();
        assert_eq!(arcs.len(), 4);
        assert_eq!(arcs[0].target.z, -2.0);
        assert_eq!(arcs[1].target.z, -4.0);
        assert_relative_eq!(arcs[2].target.x, -2.0, epsilon = 1e-9);
        assert_relative_eq!(arcs[2].target.y, 0.0, epsilon = 1e-9);
        assert_eq!(arcs[2].target.z, -5.0);
        assert_eq!(arcs[3].target, arcs[2].target);

        // Every helical move descends at the same rate per unit of arc
        let mut from = path.moves[1].target;
        for arc in &arcs[..3] {
            let planar = (arc.length_from(&from).powi(2) - (arc.target.z - from.z).powi(2)).sqrt();
            let turns = planar / (2.0 * PI * 2.0);
            assert_relative_eq!((from.z - arc.target.z) / turns, 2.0, epsilon = 1e-6);
            from = arc.target;
        }
    }

    #[test]
    fn test_conventional_helix_is_clockwise() {
        let mut config = config(6.0);
        config.cutting.direction = CutDirection::Conventional;
        let generator = BoringGenerator::from_config(&config).unwrap();
        let path = generator.generate(Point::ORIGIN, 5.0, "hole").unwrap();
        assert!(path.count(MoveType::ArcCw) > 0);
        assert_eq!(path.count(MoveType::ArcCcw), 0);
    }

    #[test]
    fn test_hole_smaller_than_tool_is_rejected() {
        let generator = BoringGenerator::from_config(&config(6.0)).unwrap();
        let err = generator.generate(Point::ORIGIN, 2.0, "hole").unwrap_err();
        assert!(matches!(
            err,
            CamToolError::Configuration(ConfigurationError::HoleSmallerThanTool { .. })
        ));
    }
}
