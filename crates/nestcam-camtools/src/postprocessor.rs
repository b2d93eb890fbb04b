//! Mach3 G-code post-processor.
//!
//! Motion words and feeds are modal: a `G` word is written only when the
//! motion mode changes and `F` only when the feed changes. Coordinates are
//! written only when their formatted value differs from the last one sent,
//! except that arcs always carry their end point and centre offsets.

use crate::error::{CamToolError, CamToolResult};
use crate::planner::PartToolpaths;
use crate::toolpath::{Move, MovePurpose, MoveType, Position};
use nestcam_core::MeasurementSystem;
use nestcam_settings::Config;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;
use tracing::info;

/// Rapid traverse rate assumed for time estimates (mm/min).
pub const RAPID_RATE: f64 = 5000.0;

/// Summary of a generated program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramStats {
    pub moves: usize,
    /// Feed move length in mm.
    pub cut_length: f64,
    /// Rapid move length in mm.
    pub rapid_length: f64,
    pub estimated_minutes: f64,
}

/// Program text with its statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcodeOutput {
    pub text: String,
    pub stats: ProgramStats,
}

impl GcodeOutput {
    pub fn save(&self, path: &Path) -> CamToolResult<()> {
        std::fs::write(path, &self.text)?;
        info!("G-code written to {}", path.display());
        Ok(())
    }
}

/// Converts planned toolpaths into a Mach3 program.
#[derive(Debug, Clone)]
pub struct PostProcessor {
    program_name: String,
    units: MeasurementSystem,
    decimals: usize,
    line_numbers: bool,
    coolant: bool,
    tool_number: u32,
    tool_diameter: f64,
    spindle_speed: u32,
    material: String,
    thickness: f64,
    safety_height: f64,
    clearance_height: f64,
    timestamp: Option<String>,
}

impl PostProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            program_name: config.post.program_name.clone(),
            units: config.post.units,
            decimals: config.post.decimals,
            line_numbers: config.post.line_numbers,
            coolant: config.post.coolant,
            tool_number: config.tool.number,
            tool_diameter: config.tool.diameter,
            spindle_speed: config.material.spindle_speed,
            material: config.material.name.clone(),
            thickness: config.material.thickness,
            safety_height: config.cutting.safety_height,
            clearance_height: config.cutting.clearance_height,
            timestamp: None,
        }
    }

    /// Adds a generation timestamp comment to the header.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn generate(&self, parts: &[PartToolpaths]) -> CamToolResult<GcodeOutput> {
        if parts.iter().all(|p| p.toolpaths.iter().all(|t| t.is_empty())) {
            return Err(CamToolError::GenerationFailed(
                "no toolpaths to post".to_string(),
            ));
        }

        let mut out = Emitter::new(self.units, self.decimals, self.line_numbers);
        self.header(&mut out)?;

        let mut stats = ProgramStats::default();
        let mut position = Position::new(0.0, 0.0, self.safety_height);
        for part in parts {
            for toolpath in &part.toolpaths {
                out.comment(&toolpath.label)?;
                for m in &toolpath.moves {
                    let length = m.length_from(&position);
                    if m.kind.is_rapid() {
                        stats.rapid_length += length;
                        stats.estimated_minutes += length / RAPID_RATE;
                    } else {
                        stats.cut_length += length;
                        if let Some(feed) = m.feed.filter(|f| *f > 0.0) {
                            stats.estimated_minutes += length / feed;
                        }
                    }
                    if out.motion(m, &position)? {
                        stats.moves += 1;
                    }
                    position = m.target;
                }
            }
        }

        self.footer(&mut out)?;
        info!(
            "Posted {} moves, {:.0}mm cutting, {:.0}mm rapid, ~{:.1} min",
            stats.moves, stats.cut_length, stats.rapid_length, stats.estimated_minutes
        );
        Ok(GcodeOutput {
            text: out.finish(),
            stats,
        })
    }

    fn header(&self, out: &mut Emitter) -> CamToolResult<()> {
        out.raw("%")?;
        out.comment(&self.program_name)?;
        out.comment(&format!(
            "Material: {} {:.3}mm",
            self.material, self.thickness
        ))?;
        out.comment(&format!(
            "Tool: T{} {:.3}mm",
            self.tool_number, self.tool_diameter
        ))?;
        out.comment(&format!("Units: {}", self.units.label()))?;
        if let Some(timestamp) = &self.timestamp {
            out.comment(&format!("Generated: {}", timestamp))?;
        }
        out.line(&format!(
            "G17 {} G40 G49 G80 G90 G94",
            self.units.gcode_word()
        ))?;
        out.line("G91.1")?;
        out.line(&format!("T{} M6", self.tool_number))?;
        out.line(&format!("S{} M3", self.spindle_speed))?;
        out.line("G54")?;
        out.rapid_z(self.safety_height)?;
        if self.coolant {
            out.line("M8")?;
        }
        Ok(())
    }

    fn footer(&self, out: &mut Emitter) -> CamToolResult<()> {
        out.rapid_z(self.clearance_height)?;
        out.line("M5")?;
        out.line("M9")?;
        out.line("G28 G91 Z0")?;
        out.line("G90")?;
        out.line("M30")?;
        out.raw("%")?;
        Ok(())
    }
}

/// Line writer carrying modal state.
struct Emitter {
    text: String,
    units: MeasurementSystem,
    decimals: usize,
    line_numbers: bool,
    next_line: u32,
    motion: Option<&'static str>,
    feed: Option<String>,
    x: Option<String>,
    y: Option<String>,
    z: Option<String>,
    purpose: Option<MovePurpose>,
}

impl Emitter {
    fn new(units: MeasurementSystem, decimals: usize, line_numbers: bool) -> Self {
        Self {
            text: String::new(),
            units,
            decimals,
            line_numbers,
            next_line: 10,
            motion: None,
            feed: None,
            x: None,
            y: None,
            z: None,
            purpose: None,
        }
    }

    fn raw(&mut self, text: &str) -> CamToolResult<()> {
        writeln!(self.text, "{}", text)?;
        Ok(())
    }

    fn comment(&mut self, text: &str) -> CamToolResult<()> {
        // Mach3 comments cannot nest parentheses
        let clean: String = text
            .chars()
            .map(|c| if c == '(' || c == ')' { '_' } else { c })
            .collect();
        writeln!(self.text, "({})", clean)?;
        Ok(())
    }

    fn line(&mut self, text: &str) -> CamToolResult<()> {
        if self.line_numbers {
            write!(self.text, "N{} ", self.next_line)?;
            self.next_line += 10;
        }
        writeln!(self.text, "{}", text)?;
        Ok(())
    }

    fn number(&self, value_mm: f64) -> String {
        let formatted = format!("{:.*}", self.decimals, self.units.from_mm(value_mm));
        match formatted.strip_prefix('-') {
            Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
            _ => formatted,
        }
    }

    /// Rapid straight up or down to `z`, always with an explicit `G00`.
    fn rapid_z(&mut self, z: f64) -> CamToolResult<()> {
        let z = self.number(z);
        self.line(&format!("G00 Z{}", z))?;
        self.motion = Some("G00");
        self.z = Some(z);
        Ok(())
    }

    /// Writes one move. Returns false when it changed nothing and was skipped.
    fn motion(&mut self, m: &Move, from: &Position) -> CamToolResult<bool> {
        if !m.kind.is_rapid() && self.purpose != Some(m.purpose) {
            self.comment(m.purpose.label())?;
            self.purpose = Some(m.purpose);
        }

        let word = match m.kind {
            MoveType::Rapid | MoveType::Retract => "G00",
            MoveType::Plunge | MoveType::Linear => "G01",
            MoveType::ArcCw => "G02",
            MoveType::ArcCcw => "G03",
        };
        let is_arc = m.kind.is_arc() && m.center.is_some();

        let x = self.number(m.target.x);
        let y = self.number(m.target.y);
        let z = self.number(m.target.z);
        let mut words = Vec::new();
        if is_arc || self.x.as_ref() != Some(&x) {
            words.push(format!("X{}", x));
        }
        if is_arc || self.y.as_ref() != Some(&y) {
            words.push(format!("Y{}", y));
        }
        if self.z.as_ref() != Some(&z) {
            words.push(format!("Z{}", z));
        }
        if let Some(center) = m.center.filter(|_| is_arc) {
            words.push(format!("I{}", self.number(center.x - from.x)));
            words.push(format!("J{}", self.number(center.y - from.y)));
        }
        if words.is_empty() {
            return Ok(false);
        }
        if let Some(feed) = m.feed.filter(|_| !m.kind.is_rapid()) {
            let f = format!("{:.0}", self.units.from_mm(feed));
            if self.feed.as_ref() != Some(&f) {
                words.push(format!("F{}", f));
                self.feed = Some(f);
            }
        }

        let mut text = String::new();
        if self.motion != Some(word) {
            text.push_str(word);
            text.push(' ');
            self.motion = Some(word);
        }
        text.push_str(&words.join(" "));
        self.line(&text)?;

        self.x = Some(x);
        self.y = Some(y);
        self.z = Some(z);
        Ok(true)
    }

    fn finish(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolpath::Toolpath;
    use nestcam_core::Point;

    fn single(moves: Vec<Move>) -> Vec<PartToolpaths> {
        let mut toolpath = Toolpath::new("test");
        toolpath.extend(moves);
        vec![PartToolpaths {
            id: "test".to_string(),
            toolpaths: vec![toolpath],
        }]
    }

    #[test]
    fn test_modal_words_are_suppressed() {
        let parts = single(vec![
            Move::rapid(Position::new(10.0, 0.0, 5.0)),
            Move::plunge(Position::new(10.0, 0.0, -1.0), 300.0, MovePurpose::OutsideContour),
            Move::linear(Position::new(20.0, 0.0, -1.0), 1000.0, MovePurpose::OutsideContour),
            Move::linear(Position::new(20.0, 10.0, -1.0), 1000.0, MovePurpose::OutsideContour),
        ]);
        let output = PostProcessor::new(&Config::default()).generate(&parts).unwrap();
        let text = &output.text;
        assert!(text.starts_with("%\n(NESTCAM)\n"));
        assert!(text.contains("G54\nG00 Z5.000\nX10.000 Y0.000\n"));
        assert!(text.contains("G01 Z-1.000 F300\n"));
        assert!(text.contains("X20.000 F1000\n"));
        assert!(text.contains("\nY10.000\n"));
        assert!(text.contains("G00 Z25.000\nM5\nM9\nG28 G91 Z0\nG90\nM30\n%\n"));
        assert_eq!(output.stats.moves, 4);
    }

    #[test]
    fn test_arc_always_has_centre_offsets() {
        let from = Position::new(2.0, 0.0, -1.0);
        let parts = single(vec![
            Move::rapid(Position::new(2.0, 0.0, 5.0)),
            Move::plunge(from, 300.0, MovePurpose::Boring),
            Move::arc(false, from, Point::ORIGIN, 1000.0, MovePurpose::Boring),
        ]);
        let text = PostProcessor::new(&Config::default())
            .generate(&parts)
            .unwrap()
            .text;
        assert!(text.contains("G03 X2.000 Y0.000 I-2.000 J0.000 F1000\n"));
        assert!(text.contains("(Boring)"));
    }

    #[test]
    fn test_header_and_footer_move_z_only() {
        let mut config = Config::default();
        config.cutting.safety_height = 8.0;
        config.cutting.clearance_height = 40.0;
        let parts = single(vec![
            Move::rapid(Position::new(50.0, 20.0, 8.0)),
            Move::plunge(Position::new(50.0, 20.0, -2.0), 300.0, MovePurpose::OutsideContour),
            Move::retract(Position::new(50.0, 20.0, 8.0)),
        ]);
        let text = PostProcessor::new(&config).generate(&parts).unwrap().text;
        assert!(text.contains("G54\nG00 Z8.000\nX50.000 Y20.000\n"));
        // The last move was already a rapid, the footer still names G00
        assert!(text.contains("G00 Z8.000\nG00 Z40.000\nM5\n"));
        assert!(!text.contains("X0.000 Y0.000"));
    }

    #[test]
    fn test_negative_zero_is_normalized() {
        let out = Emitter::new(MeasurementSystem::Metric, 3, false);
        assert_eq!(out.number(-0.0001), "0.000");
        assert_eq!(out.number(-0.5), "-0.500");
    }

    #[test]
    fn test_empty_program_is_rejected() {
        let result = PostProcessor::new(&Config::default()).generate(&[]);
        assert!(matches!(result, Err(CamToolError::GenerationFailed(_))));
    }
}
