//! Profile contouring with tool compensation, depth passes and tabs.
//!
//! Outside profiles can enter and leave along quarter arcs on the waste side,
//! so the wall never carries a plunge or retract mark.

use crate::error::{CamToolError, CamToolResult};
use crate::offset::offset_polygon;
use crate::params::CutParameters;
use crate::path::ClosedPath;
use crate::tabs::{Tab, TabPlanner};
use crate::toolpath::{Move, MovePurpose, Position, Toolpath};
use nestcam_core::constants::EPSILON;
use nestcam_core::{ConfigurationError, Point};
use nestcam_geometry::Polygon;
use nestcam_settings::{Config, CutDirection, TabSettings};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which side of the boundary the tool runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSide {
    /// Outer boundary, tool offset outward.
    Outside,
    /// Internal feature, tool offset inward.
    Inside,
}

impl ProfileSide {
    fn purpose(&self) -> MovePurpose {
        match self {
            Self::Outside => MovePurpose::OutsideContour,
            Self::Inside => MovePurpose::InsideContour,
        }
    }

    /// Whether the cut runs clockwise for the given milling direction.
    ///
    /// With a clockwise spindle, climb milling keeps the material on the
    /// tool's left: clockwise around an outside profile, counter-clockwise
    /// inside a hole.
    pub fn clockwise(&self, direction: CutDirection) -> bool {
        match (self, direction) {
            (Self::Outside, CutDirection::Climb) => true,
            (Self::Outside, CutDirection::Conventional) => false,
            (Self::Inside, CutDirection::Climb) => false,
            (Self::Inside, CutDirection::Conventional) => true,
        }
    }
}

/// Generates compensated multi-pass profile toolpaths.
#[derive(Debug, Clone)]
pub struct ContourGenerator {
    params: CutParameters,
    direction: CutDirection,
    finish_allowance: Option<f64>,
    arc_tolerance: f64,
    tabs: TabSettings,
    lead_radius: Option<f64>,
}

/// Tangential arc entry and exit for one ring.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Leads {
    /// Plunge point of the lead-in.
    start: Point,
    in_center: Point,
    out_center: Point,
    /// Where the lead-out leaves the cut.
    end: Point,
    clockwise: bool,
}

impl Leads {
    /// Leads joining `path` at arclength `at`, curving in from the side
    /// left of travel when `waste_left` is set and from the right otherwise.
    fn plan(path: &ClosedPath, at: f64, radius: f64, waste_left: bool) -> Self {
        let towards_waste = |t: Point| {
            if waste_left {
                Point::new(-t.y * radius, t.x * radius)
            } else {
                Point::new(t.y * radius, -t.x * radius)
            }
        };
        let join = path.point_at(at);
        let t_in = path.tangent_at(at);
        let t_out = path.tangent_before(at);
        let in_center = join + towards_waste(t_in);
        let out_center = join + towards_waste(t_out);
        Self {
            start: in_center - Point::new(t_in.x * radius, t_in.y * radius),
            in_center,
            out_center,
            end: out_center + Point::new(t_out.x * radius, t_out.y * radius),
            clockwise: !waste_left,
        }
    }
}

impl ContourGenerator {
    pub fn new(params: CutParameters, config: &Config) -> Self {
        Self {
            params,
            direction: config.cutting.direction,
            finish_allowance: config
                .cutting
                .finish_pass
                .then_some(config.cutting.finish_allowance),
            arc_tolerance: config.cutting.arc_tolerance,
            tabs: config.tabs.clone(),
            lead_radius: config
                .cutting
                .lead_in_out
                .then_some(config.cutting.lead_radius),
        }
    }

    pub fn from_config(config: &Config) -> CamToolResult<Self> {
        Ok(Self::new(CutParameters::from_config(config)?, config))
    }

    /// Cutting rings for `boundary` at `extra` beyond the tool radius,
    /// oriented for the milling direction.
    pub fn compensated_rings(
        &self,
        boundary: &Polygon,
        side: ProfileSide,
        extra: f64,
        feature: &str,
    ) -> CamToolResult<Vec<Polygon>> {
        let distance = self.params.tool_radius() + extra;
        let signed = match side {
            ProfileSide::Outside => distance,
            ProfileSide::Inside => -distance,
        };
        let mut rings = offset_polygon(boundary, signed, self.arc_tolerance)?;
        match side {
            ProfileSide::Outside => rings.truncate(1),
            ProfileSide::Inside if rings.is_empty() => {
                return Err(ConfigurationError::FeatureTooNarrow {
                    feature: feature.to_string(),
                    tool_diameter: self.params.tool_diameter,
                }
                .into());
            }
            ProfileSide::Inside => {}
        }
        if rings.is_empty() {
            return Err(CamToolError::OffsetFailed(format!(
                "no toolpath left for '{}'",
                feature
            )));
        }
        let clockwise = side.clockwise(self.direction);
        Ok(rings
            .into_iter()
            .map(|r| if clockwise { r.reversed() } else { r })
            .collect())
    }

    /// Full toolpath for one profile.
    ///
    /// Every depth pass cuts the whole ring. With a finish pass, all passes
    /// run at the roughing offset and one full-depth pass follows at the
    /// exact tool radius. Outside profiles get tabs on every pass that
    /// reaches the final depth, and lead arcs on every pass when enabled.
    pub fn generate(
        &self,
        boundary: &Polygon,
        side: ProfileSide,
        label: &str,
    ) -> CamToolResult<Toolpath> {
        let mut toolpath = Toolpath::new(label);
        let final_depth = self.params.depths.final_depth();

        let mut stages: Vec<(f64, Vec<f64>)> = Vec::new();
        match self.finish_allowance {
            Some(allowance) if allowance > EPSILON => {
                stages.push((allowance, self.params.depths.depths().to_vec()));
                stages.push((0.0, vec![final_depth]));
            }
            _ => stages.push((0.0, self.params.depths.depths().to_vec())),
        }

        for (extra, depths) in &stages {
            let rings = self.compensated_rings(boundary, side, *extra, label)?;
            for ring in &rings {
                let path = ClosedPath::new(ring);
                if path.len() < 3 {
                    continue;
                }
                let tabs = if side == ProfileSide::Outside {
                    TabPlanner::new(self.tabs.clone(), self.params.tool_diameter).plan(&path)
                } else {
                    Vec::new()
                };
                debug!(
                    "{}: {} passes at +{:.3}mm, {} tabs, length {:.1}mm",
                    label,
                    depths.len(),
                    extra,
                    tabs.len(),
                    path.length()
                );
                self.cut_ring(&mut toolpath, &path, depths, &tabs, side);
            }
        }
        Ok(toolpath)
    }

    fn tab_z(&self, tab: &Tab) -> f64 {
        (-self.params.depths.final_depth() + tab.height).min(0.0)
    }

    fn cut_ring(
        &self,
        toolpath: &mut Toolpath,
        path: &ClosedPath,
        depths: &[f64],
        tabs: &[Tab],
        side: ProfileSide,
    ) {
        let final_depth = self.params.depths.final_depth();
        let purpose = side.purpose();
        // Never start inside a tab
        let start = tabs
            .iter()
            .find(|t| t.contains(0.0))
            .map_or(0.0, |t| t.end);
        let entry = path.point_at(start);
        let safety = self.params.safety_height;
        let feed = self.params.feed_rate;
        // Outside the part, the waste lies left of travel on a clockwise ring
        let leads = match (side, self.lead_radius) {
            (ProfileSide::Outside, Some(radius)) => Some(Leads::plan(
                path,
                start,
                radius,
                side.clockwise(self.direction),
            )),
            _ => None,
        };

        if leads.is_none() {
            toolpath.push(Move::rapid(Position::at(entry, safety)));
        }
        for &depth in depths {
            let z = -depth;
            let pass_tabs: &[Tab] = if depth >= final_depth - EPSILON {
                tabs
            } else {
                &[]
            };
            let Some(leads) = leads else {
                toolpath.push(Move::plunge(
                    Position::at(entry, z),
                    self.params.plunge_rate,
                    purpose,
                ));
                self.walk(toolpath, path, start, z, pass_tabs, purpose);
                continue;
            };
            toolpath.push(Move::rapid(Position::at(leads.start, safety)));
            toolpath.push(Move::plunge(
                Position::at(leads.start, z),
                self.params.plunge_rate,
                MovePurpose::LeadIn,
            ));
            toolpath.push(Move::arc(
                leads.clockwise,
                Position::at(entry, z),
                leads.in_center,
                feed,
                MovePurpose::LeadIn,
            ));
            self.walk(toolpath, path, start, z, pass_tabs, purpose);
            toolpath.push(Move::arc(
                leads.clockwise,
                Position::at(leads.end, z),
                leads.out_center,
                feed,
                MovePurpose::LeadOut,
            ));
            toolpath.push(Move::retract(Position::at(leads.end, safety)));
        }
        if leads.is_none() {
            toolpath.push(Move::retract(Position::at(entry, safety)));
        }
    }

    /// One lap of `path` at `z`, starting at arclength `start` and rising
    /// over each tab.
    fn walk(
        &self,
        toolpath: &mut Toolpath,
        path: &ClosedPath,
        start: f64,
        z: f64,
        tabs: &[Tab],
        purpose: MovePurpose,
    ) {
        let length = path.length();
        let offset_from_start = |s: f64| path.wrap(s - start);

        let mut breaks: Vec<f64> = (0..path.len())
            .map(|i| offset_from_start(path.vertex_distance(i)))
            .chain(tabs.iter().flat_map(|t| {
                [offset_from_start(t.start), offset_from_start(t.end)]
            }))
            .collect();
        breaks.push(0.0);
        breaks.push(length);
        breaks.sort_by(f64::total_cmp);
        breaks.dedup_by(|a, b| (*a - *b).abs() < EPSILON);

        let feed = self.params.feed_rate;
        let mut current_z = z;
        for pair in breaks.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let middle = path.wrap(start + (a + b) / 2.0);
            let tab = tabs.iter().find(|t| t.contains(middle));
            let segment_z = tab.map_or(z, |t| self.tab_z(t).max(z));
            let from = path.point_at(start + a);
            if (segment_z - current_z).abs() > EPSILON {
                let target = Position::at(from, segment_z);
                if segment_z > current_z {
                    toolpath.push(Move::linear(target, feed, MovePurpose::Tab));
                } else {
                    toolpath.push(Move::plunge(target, self.params.plunge_rate, purpose));
                }
                current_z = segment_z;
            }
            let segment_purpose = if tab.is_some() {
                MovePurpose::Tab
            } else {
                purpose
            };
            toolpath.push(Move::linear(
                Position::at(path.point_at(start + b), segment_z),
                feed,
                segment_purpose,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolpath::MoveType;
    use approx::assert_relative_eq;

    fn square(size: f64) -> Polygon {
        Polygon::from_tuples(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size)])
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.material.thickness = 10.0;
        config.material.step_down = 3.0;
        config
    }

    #[test]
    fn test_outside_profile_passes_and_depth() {
        let mut config = config();
        config.tabs.enabled = false;
        let generator = ContourGenerator::from_config(&config).unwrap();
        let path = generator
            .generate(&square(100.0), ProfileSide::Outside, "square")
            .unwrap();
        assert_eq!(path.count(MoveType::Plunge), 4);
        assert_relative_eq!(path.min_z().unwrap(), -10.0);
        let b = Polygon::new(path.moves.iter().map(|m| m.target.xy()).collect())
            .bounds()
            .unwrap();
        assert_relative_eq!(b.min_x, -3.175 / 2.0, epsilon = 1e-6);
        assert_relative_eq!(b.max_x, 100.0 + 3.175 / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_climb_outside_runs_clockwise() {
        let generator = ContourGenerator::from_config(&config()).unwrap();
        let rings = generator
            .compensated_rings(&square(50.0), ProfileSide::Outside, 0.0, "square")
            .unwrap();
        assert!(!rings[0].is_ccw());
        let rings = generator
            .compensated_rings(&square(50.0), ProfileSide::Inside, 0.0, "pocket")
            .unwrap();
        assert!(rings[0].is_ccw());
    }

    #[test]
    fn test_tabs_only_on_final_pass() {
        let generator = ContourGenerator::from_config(&config()).unwrap();
        let path = generator
            .generate(&square(200.0), ProfileSide::Outside, "square")
            .unwrap();
        let tab_moves: Vec<_> = path
            .moves
            .iter()
            .filter(|m| m.purpose == MovePurpose::Tab)
            .collect();
        assert!(!tab_moves.is_empty());
        for m in tab_moves {
            assert_relative_eq!(m.target.z, -7.0);
        }
        // Tabs are cut around, so the tool never reaches full depth inside them
        assert!(path.moves.iter().any(|m| m.target.z == -10.0));
    }

    #[test]
    fn test_narrow_slot_is_configuration_error() {
        let generator = ContourGenerator::from_config(&config()).unwrap();
        let slot = Polygon::from_tuples(&[(0.0, 0.0), (40.0, 0.0), (40.0, 2.0), (0.0, 2.0)]);
        let err = generator
            .generate(&slot, ProfileSide::Inside, "slot")
            .unwrap_err();
        assert!(matches!(
            err,
            CamToolError::Configuration(ConfigurationError::FeatureTooNarrow { .. })
        ));
    }

    #[test]
    fn test_finish_pass_adds_full_depth_lap() {
        let mut config = config();
        config.tabs.enabled = false;
        config.cutting.finish_pass = true;
        config.cutting.finish_allowance = 0.5;
        let generator = ContourGenerator::from_config(&config).unwrap();
        let path = generator
            .generate(&square(100.0), ProfileSide::Outside, "square")
            .unwrap();
        assert_eq!(path.count(MoveType::Plunge), 5);
        let rough_x = -3.175 / 2.0 - 0.5;
        assert!(path
            .moves
            .iter()
            .any(|m| (m.target.x - rough_x).abs() < 1e-6));
        let last_cut = path
            .moves
            .iter()
            .rev()
            .find(|m| m.kind == MoveType::Linear)
            .unwrap();
        assert_relative_eq!(last_cut.target.z, -10.0);
    }

    #[test]
    fn test_leads_curve_in_from_the_waste_side() {
        // Clockwise square starting at the origin heading up the left edge
        let ring = Polygon::from_tuples(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);
        let path = ClosedPath::new(&ring);
        let leads = Leads::plan(&path, 0.0, 2.0, true);
        assert!(leads.in_center.approx_eq(&Point::new(-2.0, 0.0), 1e-9));
        assert!(leads.start.approx_eq(&Point::new(-2.0, -2.0), 1e-9));
        assert!(leads.out_center.approx_eq(&Point::new(0.0, -2.0), 1e-9));
        assert!(leads.end.approx_eq(&Point::new(-2.0, -2.0), 1e-9));
        assert!(!leads.clockwise);
    }

    #[test]
    fn test_lap_returns_to_entry() {
        let mut config = config();
        config.tabs.enabled = false;
        let generator = ContourGenerator::from_config(&config).unwrap();
        let path = generator
            .generate(&square(30.0), ProfileSide::Inside, "pocket")
            .unwrap();
        let entry = path.start().unwrap();
        let last_cut = path
            .moves
            .iter()
            .rev()
            .find(|m| m.kind == MoveType::Linear)
            .unwrap();
        assert!(last_cut.target.xy().approx_eq(&entry, 1e-9));
    }
}
