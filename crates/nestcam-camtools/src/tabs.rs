//! Holding tab placement.
//!
//! Tabs are short spans of the final pass where the tool rises and leaves
//! a bridge of material. They are spread evenly around the outline and
//! kept away from corners, where a bridge would be hard to clean up.

use crate::path::ClosedPath;
use nestcam_core::constants::EPSILON;
use nestcam_core::Point;
use nestcam_settings::TabSettings;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A tab span along a closed path, given by arclength.
///
/// `start` may be greater than `end` when the tab wraps past the path start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub start: f64,
    pub end: f64,
    /// Arclength of the tab centre.
    pub center: f64,
    pub center_point: Point,
    /// Height of the bridge above the bottom of the cut.
    pub height: f64,
}

impl Tab {
    /// Whether arclength `s` (already wrapped) falls inside the tab.
    pub fn contains(&self, s: f64) -> bool {
        if self.start <= self.end {
            s >= self.start && s <= self.end
        } else {
            s >= self.start || s <= self.end
        }
    }
}

/// Chooses tab positions for a closed cutting path.
#[derive(Debug, Clone)]
pub struct TabPlanner {
    settings: TabSettings,
    tool_diameter: f64,
}

impl TabPlanner {
    pub fn new(settings: TabSettings, tool_diameter: f64) -> Self {
        Self {
            settings,
            tool_diameter,
        }
    }

    /// Number of tabs for a path of `length`.
    pub fn tab_count(&self, length: f64) -> usize {
        let by_spacing = (length / self.settings.max_spacing).ceil() as usize;
        by_spacing.max(self.settings.min_per_part as usize)
    }

    /// Vertices whose turning angle exceeds the corner threshold.
    ///
    /// Turning is summed over the vertices within half a tool diameter on
    /// either side, so an offset corner rounded into several short
    /// segments still counts as one corner.
    pub fn corners(&self, path: &ClosedPath) -> Vec<Point> {
        let n = path.len();
        if n < 3 {
            return Vec::new();
        }
        let points = path.points();
        let turning: Vec<f64> = (0..n)
            .map(|i| {
                let prev = points[(i + n - 1) % n];
                let here = points[i];
                let next = points[(i + 1) % n];
                let a = (here.y - prev.y).atan2(here.x - prev.x);
                let b = (next.y - here.y).atan2(next.x - here.x);
                let mut d = b - a;
                while d > std::f64::consts::PI {
                    d -= 2.0 * std::f64::consts::PI;
                }
                while d < -std::f64::consts::PI {
                    d += 2.0 * std::f64::consts::PI;
                }
                d
            })
            .collect();

        let window = self.tool_diameter / 2.0;
        let threshold = self.settings.corner_angle_threshold.to_radians();
        (0..n)
            .filter(|&i| {
                let si = path.vertex_distance(i);
                let total: f64 = (0..n)
                    .filter(|&j| path.circular_distance(si, path.vertex_distance(j)) <= window)
                    .map(|j| turning[j])
                    .sum();
                total.abs() > threshold
            })
            .map(|i| points[i])
            .collect()
    }

    fn is_valid(&self, point: Point, corners: &[Point]) -> bool {
        corners
            .iter()
            .all(|c| c.distance_to(&point) >= self.settings.corner_exclusion)
    }

    /// Plans tabs for `path`. Returns no tabs when tabs are disabled.
    pub fn plan(&self, path: &ClosedPath) -> Vec<Tab> {
        let length = path.length();
        if !self.settings.enabled || length <= EPSILON {
            return Vec::new();
        }
        let count = self.tab_count(length);
        if count == 0 {
            return Vec::new();
        }
        let corners = self.corners(path);

        let oversampled = count * 3;
        let candidates: Vec<f64> = (0..oversampled)
            .map(|k| length * k as f64 / oversampled as f64)
            .filter(|&s| self.is_valid(path.point_at(s), &corners))
            .collect();

        let mut centers = if candidates.len() >= count {
            spread_greedy(path, &candidates, count)
        } else {
            debug!(
                "Only {} of {} tab candidates clear corners, sliding evenly spaced tabs",
                candidates.len(),
                oversampled
            );
            self.slide_even(path, &corners, count)
        };
        centers.sort_by(f64::total_cmp);
        centers.dedup_by(|a, b| path.circular_distance(*a, *b) < self.settings.width);

        let half = self.settings.width / 2.0;
        centers
            .into_iter()
            .map(|s| Tab {
                start: path.wrap(s - half),
                end: path.wrap(s + half),
                center: s,
                center_point: path.point_at(s),
                height: self.settings.height,
            })
            .collect()
    }

    /// Evenly spaced positions, each moved to the nearest arclength that
    /// clears every corner. Positions with nowhere to go are dropped.
    fn slide_even(&self, path: &ClosedPath, corners: &[Point], count: usize) -> Vec<f64> {
        let length = path.length();
        let step = (length / 1000.0).min(0.5).max(EPSILON);
        let max_steps = (length / 2.0 / step).ceil() as usize;

        (0..count)
            .filter_map(|k| {
                let target = length * k as f64 / count as f64;
                let found = (0..=max_steps).find_map(|i| {
                    let ahead = path.wrap(target + step * i as f64);
                    if self.is_valid(path.point_at(ahead), corners) {
                        return Some(ahead);
                    }
                    let behind = path.wrap(target - step * i as f64);
                    self.is_valid(path.point_at(behind), corners)
                        .then_some(behind)
                });
                if found.is_none() {
                    warn!(
                        "No corner-free position for tab {} of {}, dropping it",
                        k + 1,
                        count
                    );
                }
                found
            })
            .collect()
    }
}

/// Picks `count` candidates, each maximizing its distance to those already
/// picked. The first candidate always starts the set; ties keep the earlier one.
fn spread_greedy(path: &ClosedPath, candidates: &[f64], count: usize) -> Vec<f64> {
    let mut chosen = vec![candidates[0]];
    while chosen.len() < count {
        let mut best: Option<(f64, f64)> = None;
        for &c in candidates {
            let nearest = chosen
                .iter()
                .map(|&s| path.circular_distance(s, c))
                .fold(f64::INFINITY, f64::min);
            if nearest <= EPSILON {
                continue;
            }
            if best.is_none_or(|(_, d)| nearest > d + EPSILON) {
                best = Some((c, nearest));
            }
        }
        match best {
            Some((c, _)) => chosen.push(c),
            None => break,
        }
    }
    chosen
}
