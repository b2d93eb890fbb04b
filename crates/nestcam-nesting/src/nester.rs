//! Bottom-left-fill nesting with a quarter-turn rotation search.
//!
//! Parts are placed largest first and never moved again. For every allowed
//! rotation the grid is scanned row by row from the sheet origin and the
//! first collision-free position is that rotation's candidate. The
//! candidate growing the occupied rectangle `(x + w) * (y + h)` the least
//! wins; ties keep the earlier rotation.

use crate::error::NestResult;
use crate::part::NestPart;
use crate::result::{NestingResult, Placement, PlacementFailure, UnfittedPart};
use crate::transform::PartTransform;
use nestcam_core::constants::EPSILON;
use nestcam_core::error::{require_non_negative, require_positive};
use nestcam_core::{Bounds, ConfigurationError};
use nestcam_geometry::{Polygon, PreparedPolygon, QuarterTurn};
use nestcam_settings::NestingSettings;
use std::cmp::Ordering;
use tracing::{debug, info};

/// Places parts on a single rectangular sheet.
#[derive(Debug, Clone, Default)]
pub struct Nester {
    settings: NestingSettings,
}

struct Candidate {
    transform: PartTransform,
    score: f64,
}

impl Nester {
    pub fn new(settings: NestingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NestingSettings {
        &self.settings
    }

    fn rotations(&self) -> NestResult<Vec<QuarterTurn>> {
        self.settings
            .rotations
            .iter()
            .map(|&deg| {
                QuarterTurn::from_degrees(deg).ok_or_else(|| {
                    ConfigurationError::invalid(
                        "nesting.rotations",
                        format!("{deg} is not a quarter turn"),
                    )
                    .into()
                })
            })
            .collect()
    }

    fn validate(&self) -> NestResult<Vec<QuarterTurn>> {
        let s = &self.settings;
        require_positive("nesting.sheet_width", s.sheet_width)?;
        require_positive("nesting.sheet_height", s.sheet_height)?;
        require_non_negative("nesting.spacing", s.spacing)?;
        require_positive("nesting.min_grid_step", s.min_grid_step)?;
        if s.grid_divisions == 0 {
            return Err(
                ConfigurationError::invalid("nesting.grid_divisions", "must be > 0").into(),
            );
        }
        let rotations = self.rotations()?;
        if rotations.is_empty() {
            return Err(
                ConfigurationError::invalid("nesting.rotations", "must not be empty").into(),
            );
        }
        Ok(rotations)
    }

    /// Nests `parts` onto the sheet.
    ///
    /// Parts that do not fit are listed in [`NestingResult::unfitted`].
    /// An empty part list is a [`ConfigurationError::NoValidParts`].
    pub fn nest(&self, parts: &[NestPart]) -> NestResult<NestingResult> {
        let rotations = self.validate()?;
        if parts.is_empty() {
            return Err(ConfigurationError::NoValidParts.into());
        }
        let s = &self.settings;

        let mut order: Vec<usize> = (0..parts.len()).collect();
        order.sort_by(|&a, &b| {
            parts[b]
                .area()
                .partial_cmp(&parts[a].area())
                .unwrap_or(Ordering::Equal)
        });

        let mut placed: Vec<PreparedPolygon> = Vec::new();
        let mut placements = Vec::new();
        let mut unfitted = Vec::new();
        let mut placed_area = 0.0;

        for index in order {
            let part = &parts[index];
            let outline = part.outline();
            let Some(bounds) = outline.bounds() else {
                unfitted.push(UnfittedPart {
                    index,
                    id: part.id.clone(),
                    reason: PlacementFailure::NoFreePosition,
                });
                continue;
            };

            let mut fits_sheet = false;
            let mut best: Option<Candidate> = None;
            for &rotation in &rotations {
                let transform = PartTransform::new(&bounds, rotation);
                let (w, h) = (transform.width, transform.height);
                if w + s.spacing > s.sheet_width || h + s.spacing > s.sheet_height {
                    debug!(
                        "{}: {} rotation ({:.1} x {:.1}) exceeds the sheet",
                        part.id, rotation, w, h
                    );
                    continue;
                }
                fits_sheet = true;

                if let Some(found) = self.first_free_position(&outline, &transform, &placed) {
                    let score = (found.position.x + w) * (found.position.y + h);
                    if best.as_ref().is_none_or(|b| score < b.score) {
                        best = Some(Candidate {
                            transform: found,
                            score,
                        });
                    }
                }
            }

            match best {
                Some(Candidate { transform, .. }) => {
                    let polygon = transform.apply(&outline);
                    if let Some(prepared) = PreparedPolygon::new(&polygon) {
                        placed.push(prepared);
                    }
                    placed_area += part.area();
                    info!(
                        "Placed {} at ({:.1}, {:.1}) rotated {}",
                        part.id, transform.position.x, transform.position.y, transform.rotation
                    );
                    placements.push(Placement {
                        index,
                        id: part.id.clone(),
                        x: transform.position.x,
                        y: transform.position.y,
                        rotation: transform.rotation,
                        width: transform.width,
                        height: transform.height,
                        transform,
                    });
                }
                None => {
                    let reason = if fits_sheet {
                        PlacementFailure::NoFreePosition
                    } else {
                        PlacementFailure::ExceedsSheet {
                            width: bounds.width(),
                            height: bounds.height(),
                        }
                    };
                    info!("Could not place {}: {}", part.id, reason);
                    unfitted.push(UnfittedPart {
                        index,
                        id: part.id.clone(),
                        reason,
                    });
                }
            }
        }

        let sheet_area = s.sheet_width * s.sheet_height;
        let utilization_percent = placed_area / sheet_area * 100.0;
        let message = format!(
            "Placed {} of {} parts, {:.1}% sheet utilization",
            placements.len(),
            parts.len(),
            utilization_percent
        );
        info!("{}", message);

        Ok(NestingResult {
            sheet_width: s.sheet_width,
            sheet_height: s.sheet_height,
            spacing: s.spacing,
            placed_count: placements.len(),
            total_parts: parts.len(),
            placements,
            unfitted,
            utilization_percent,
            message,
        })
    }

    /// First grid position, row by row from the origin, where `outline`
    /// keeps `spacing` clear of every placed polygon.
    fn first_free_position(
        &self,
        outline: &Polygon,
        transform: &PartTransform,
        placed: &[PreparedPolygon],
    ) -> Option<PartTransform> {
        let s = &self.settings;
        let (w, h) = (transform.width, transform.height);
        let step = (w.min(h) / s.grid_divisions as f64).max(s.min_grid_step);
        let columns = ((s.sheet_width - w + EPSILON) / step).floor() as usize;
        let rows = ((s.sheet_height - h + EPSILON) / step).floor() as usize;

        for row in 0..=rows {
            let y = row as f64 * step;
            for column in 0..=columns {
                let x = column as f64 * step;
                let candidate = transform.at(x, y);
                if self.is_free(outline, &candidate, placed) {
                    return Some(candidate);
                }
            }
        }
        None
    }

    fn is_free(
        &self,
        outline: &Polygon,
        candidate: &PartTransform,
        placed: &[PreparedPolygon],
    ) -> bool {
        let spacing = self.settings.spacing;
        let reach: Bounds = candidate.bounds().expanded(spacing);
        let nearby: Vec<&PreparedPolygon> = placed
            .iter()
            .filter(|p| reach.overlaps(p.bounds()))
            .collect();
        if nearby.is_empty() {
            return true;
        }
        let Some(polygon) = PreparedPolygon::new(&candidate.apply(outline)) else {
            return false;
        };
        !nearby.iter().any(|p| polygon.conflicts_with(p, spacing))
    }
}
