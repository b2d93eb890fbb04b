//! A nesting job: load drawings, nest, export and post.
//!
//! A [`Job`] owns everything one run needs and is consumed by [`Job::run`].
//! Drawings that cannot be read or contain no closed contour are skipped
//! and reported. Placed parts whose features the tool cannot cut are left
//! out of the G-code and reported the same way. The run only fails when
//! nothing usable is left or a setting makes the request impossible.

use anyhow::{Context, Result};
use nestcam_camtools::{PartFailure, PostProcessor, ProgramStats, ToolpathPlanner};
use nestcam_geometry::{Part, SourceEntity};
use nestcam_nesting::{write_nested_dxf, NestPart, Nester, NestingResult};
use nestcam_settings::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One candidate part drawing.
#[derive(Debug, Clone)]
pub enum JobInput {
    /// A DXF file on disk; the file name becomes the part id.
    File(PathBuf),
    /// Entities already read into memory.
    Drawing {
        id: String,
        entities: Vec<SourceEntity>,
    },
}

impl JobInput {
    pub fn id(&self) -> String {
        match self {
            Self::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Drawing { id, .. } => id.clone(),
        }
    }
}

/// An input that was left out of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedInput {
    pub id: String,
    pub reason: String,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub nesting: NestingResult,
    pub skipped: Vec<SkippedInput>,
    /// Placed parts left out of the G-code.
    pub toolpath_failures: Vec<PartFailure>,
    pub dxf_path: PathBuf,
    pub gcode_path: Option<PathBuf>,
    pub program: Option<ProgramStats>,
}

impl JobReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A nesting request passed by value.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub inputs: Vec<JobInput>,
    pub config: Config,
    pub output_dir: PathBuf,
    /// Also plan toolpaths and write G-code.
    pub generate_gcode: bool,
    /// Written into the G-code header when set.
    pub timestamp: Option<String>,
}

impl Job {
    pub fn new(name: impl Into<String>, config: Config, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            config,
            output_dir: output_dir.into(),
            generate_gcode: false,
            timestamp: None,
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(JobInput::File(path.into()));
        self
    }

    pub fn with_drawing(mut self, id: impl Into<String>, entities: Vec<SourceEntity>) -> Self {
        self.inputs.push(JobInput::Drawing {
            id: id.into(),
            entities,
        });
        self
    }

    pub fn with_gcode(mut self, enabled: bool) -> Self {
        self.generate_gcode = enabled;
        self
    }

    /// Extracts and classifies every input, skipping the unusable ones.
    pub fn load_parts(&self) -> (Vec<NestPart>, Vec<SkippedInput>) {
        let mut parts = Vec::new();
        let mut skipped = Vec::new();
        for input in &self.inputs {
            let loaded = match input {
                JobInput::File(path) => NestPart::from_file(path, &self.config.extraction),
                JobInput::Drawing { id, entities } => {
                    NestPart::from_entities(id.clone(), entities.clone(), &self.config.extraction)
                }
            };
            match loaded {
                Ok(part) => parts.push(part),
                Err(e) => {
                    warn!("Skipping {}: {}", input.id(), e);
                    skipped.push(SkippedInput {
                        id: input.id(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        info!("Loaded {} of {} drawings", parts.len(), self.inputs.len());
        (parts, skipped)
    }

    pub fn run(self) -> Result<JobReport> {
        self.config.validate().context("Invalid configuration")?;
        std::fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create {}", self.output_dir.display())
        })?;

        let (parts, skipped) = self.load_parts();
        let nesting = Nester::new(self.config.nesting.clone())
            .nest(&parts)
            .context("Nesting failed")?;
        info!("{}", nesting.message);

        let dxf_path = self.output_path("nested.dxf");
        write_nested_dxf(&parts, &nesting, &dxf_path)
            .with_context(|| format!("Failed to write {}", dxf_path.display()))?;

        let mut toolpath_failures = Vec::new();
        let (gcode_path, program) = if self.generate_gcode && !nesting.placements.is_empty() {
            let path = self.output_path("nc");
            let (stats, failures) = self.post(&parts, &nesting, &path)?;
            toolpath_failures = failures;
            match stats {
                Some(stats) => (Some(path), Some(stats)),
                None => (None, None),
            }
        } else {
            (None, None)
        };

        let report = JobReport {
            nesting,
            skipped,
            toolpath_failures,
            dxf_path,
            gcode_path,
            program,
        };
        let report_path = self.output_path("report.json");
        std::fs::write(&report_path, report.to_json()?)
            .with_context(|| format!("Failed to write {}", report_path.display()))?;
        Ok(report)
    }

    /// Plans toolpaths for the placed parts in sheet coordinates and writes
    /// the program to `path`. No program is written when every part fails.
    fn post(
        &self,
        parts: &[NestPart],
        nesting: &NestingResult,
        path: &Path,
    ) -> Result<(Option<ProgramStats>, Vec<PartFailure>)> {
        let placed: Vec<(String, Part)> = nesting
            .placements
            .iter()
            .flat_map(|placement| {
                let placed_parts = placement.placed_parts(&parts[placement.index]);
                let many = placed_parts.len() > 1;
                placed_parts.into_iter().enumerate().map(move |(k, part)| {
                    let id = if many {
                        format!("{} #{}", placement.id, k + 1)
                    } else {
                        placement.id.clone()
                    };
                    (id, part)
                })
            })
            .collect();

        let planner = ToolpathPlanner::from_config(&self.config)?;
        let plan = planner.plan(&placed);
        if plan.parts.is_empty() {
            warn!("No placed part could be cut, skipping G-code");
            return Ok((None, plan.failures));
        }
        let mut post = PostProcessor::new(&self.config);
        if let Some(timestamp) = &self.timestamp {
            post = post.with_timestamp(timestamp.clone());
        }
        let output = post.generate(&plan.parts)?;
        output
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok((Some(output.stats), plan.failures))
    }

    fn output_path(&self, suffix: &str) -> PathBuf {
        let separator = if suffix.contains('.') { "_" } else { "." };
        self.output_dir
            .join(format!("{}{}{}", self.name, separator, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestcam_core::Point;
    use nestcam_geometry::{new_drawing, save_drawing, to_dxf_entity, Geometry};
    use nestcam_nesting::PlacementFailure;
    use tempfile::TempDir;

    fn plate_entities(w: f64, h: f64) -> Vec<Geometry> {
        vec![
            Geometry::rectangle(0.0, 0.0, w, h),
            Geometry::Circle {
                center: Point::new(20.0, 20.0),
                radius: 5.0,
            },
        ]
    }

    fn write_part(dir: &TempDir, name: &str, geometries: &[Geometry]) -> PathBuf {
        let mut drawing = new_drawing();
        for geometry in geometries {
            drawing.add_entity(to_dxf_entity(geometry, "CUT", 7));
        }
        let path = dir.path().join(name);
        save_drawing(&drawing, &path).unwrap();
        path
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.nesting.sheet_width = 600.0;
        config.nesting.sheet_height = 400.0;
        config
    }

    #[test]
    fn test_gcode_job_writes_all_outputs() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let a = write_part(&input, "a.dxf", &plate_entities(200.0, 120.0));
        let b = write_part(&input, "b.dxf", &plate_entities(150.0, 100.0));
        let broken = input.path().join("broken.dxf");
        std::fs::write(&broken, "not a drawing").unwrap();

        let mut job = Job::new("sheet1", config(), output.path())
            .with_file(a)
            .with_file(b)
            .with_file(broken)
            .with_gcode(true);
        job.timestamp = Some("2026-10-16 12:00:00".to_string());
        let report = job.run().unwrap();

        assert_eq!(report.nesting.placed_count, 2);
        assert_eq!(report.nesting.total_parts, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].id, "broken.dxf");
        assert!(report.toolpath_failures.is_empty());

        assert!(report.dxf_path.exists());
        assert_eq!(report.dxf_path, output.path().join("sheet1_nested.dxf"));
        let gcode_path = report.gcode_path.clone().unwrap();
        let gcode = std::fs::read_to_string(&gcode_path).unwrap();
        assert!(gcode.contains("(Generated: 2026-10-16 12:00:00)"));
        assert!(gcode.contains("(a.dxf outline)"));
        assert!(gcode.contains("(b.dxf hole 1)"));
        assert!(report.program.as_ref().unwrap().moves > 0);

        let summary = std::fs::read_to_string(output.path().join("sheet1_report.json")).unwrap();
        assert!(summary.contains("\"utilization_percent\""));
    }

    #[test]
    fn test_uncuttable_part_does_not_stop_the_sheet() {
        let output = TempDir::new().unwrap();
        let drawing = |geometries: Vec<Geometry>| -> Vec<SourceEntity> {
            geometries
                .into_iter()
                .map(|g| SourceEntity::new("0", g))
                .collect()
        };
        // A 1mm hole cannot be bored with the default 3.175mm tool
        let tiny_hole = drawing(vec![
            Geometry::rectangle(0.0, 0.0, 80.0, 80.0),
            Geometry::Circle {
                center: Point::new(40.0, 40.0),
                radius: 1.0,
            },
        ]);
        let good = drawing(vec![Geometry::rectangle(0.0, 0.0, 100.0, 100.0)]);

        let report = Job::new("mixed", config(), output.path())
            .with_drawing("good", good)
            .with_drawing("tiny", tiny_hole)
            .with_gcode(true)
            .run()
            .unwrap();

        assert_eq!(report.nesting.placed_count, 2);
        assert_eq!(report.toolpath_failures.len(), 1);
        assert_eq!(report.toolpath_failures[0].id, "tiny");
        assert!(report.toolpath_failures[0].reason.contains("smaller than tool radius"));

        let gcode = std::fs::read_to_string(report.gcode_path.as_ref().unwrap()).unwrap();
        assert!(gcode.contains("(good outline)"));
        assert!(!gcode.contains("(tiny"));

        let summary = std::fs::read_to_string(output.path().join("mixed_report.json")).unwrap();
        assert!(summary.contains("\"toolpath_failures\""));
        assert!(summary.contains("\"tiny\""));
    }

    #[test]
    fn test_no_cuttable_part_still_writes_report() {
        let output = TempDir::new().unwrap();
        let entities = vec![
            SourceEntity::new("0", Geometry::rectangle(0.0, 0.0, 80.0, 80.0)),
            SourceEntity::new(
                "0",
                Geometry::Circle {
                    center: Point::new(40.0, 40.0),
                    radius: 1.0,
                },
            ),
        ];
        let report = Job::new("bad", config(), output.path())
            .with_drawing("tiny", entities)
            .with_gcode(true)
            .run()
            .unwrap();

        assert!(report.gcode_path.is_none());
        assert!(report.program.is_none());
        assert_eq!(report.toolpath_failures.len(), 1);
        assert!(!output.path().join("bad.nc").exists());
        assert!(output.path().join("bad_report.json").exists());
    }

    #[test]
    fn test_nest_only_job_from_memory() {
        let output = TempDir::new().unwrap();
        let entities: Vec<SourceEntity> = plate_entities(100.0, 100.0)
            .into_iter()
            .map(|g| SourceEntity::new("0", g))
            .collect();
        let report = Job::new("memory", config(), output.path())
            .with_drawing("square", entities)
            .with_drawing(
                "oversized",
                vec![SourceEntity::new("0", Geometry::rectangle(0.0, 0.0, 900.0, 900.0))],
            )
            .run()
            .unwrap();

        assert!(report.gcode_path.is_none());
        assert_eq!(report.nesting.placed_count, 1);
        assert_eq!(report.nesting.unfitted.len(), 1);
        assert_eq!(report.nesting.unfitted[0].id, "oversized");
        assert!(matches!(
            report.nesting.unfitted[0].reason,
            PlacementFailure::ExceedsSheet { .. }
        ));
    }

    #[test]
    fn test_no_usable_drawings_fails() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        let open = write_part(
            &input,
            "open.dxf",
            &[Geometry::Line {
                start: Point::new(0.0, 0.0),
                end: Point::new(50.0, 0.0),
            }],
        );
        let result = Job::new("empty", config(), output.path())
            .with_file(open)
            .run();
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("No valid parts"), "{message}");
    }
}
