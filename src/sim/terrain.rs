//! Procedural terrain stream
//!
//! The track surface is an ordered polyline of [`Segment`]s extended ahead of
//! the vehicle by a slope-random-walk generator and pruned behind a trailing
//! window, so memory stays bounded on an unbounded track. Each new segment is
//! also rasterized into a sparse column -> ground-row index for O(1)
//! "ground near x" queries.

use std::collections::{HashMap, VecDeque};

use glam::DVec2;
use log::trace;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geom::Segment;
use crate::consts::{CELL, STEP};
use crate::tuning::LevelParams;

/// How far the height index keeps columns behind the first retained segment
const PRUNE_KEEP_MARGIN_COLS: i64 = 4;
/// Linear probe radius for nearest-column ground lookups
const GROUND_PROBE_COLS: i64 = 8;

/// Windowed terrain representation: retained segments plus a sparse height index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainStream {
    segments: VecDeque<Segment>,
    height_at_col: HashMap<i64, i64>,
    /// Frontier of generation; the next segment starts here
    last_x: f64,
    last_y: f64,
    slope: f64,
    difficulty: f64,
    irregularity: f64,
    height_bias: f64,
    /// Screen height used by the bias term steering the walk toward mid-screen
    base_height: f64,
    /// Retained-segment cap (about three viewport widths)
    max_segments: usize,
}

impl TerrainStream {
    pub fn new(params: &LevelParams, view_width: f64, view_height: f64) -> Self {
        Self {
            segments: VecDeque::new(),
            height_at_col: HashMap::new(),
            last_x: 0.0,
            last_y: view_height / 2.0,
            slope: 0.0,
            difficulty: params.difficulty_init,
            irregularity: params.irregularity_init,
            height_bias: params.height_bias_init,
            base_height: view_height,
            max_segments: ((view_width / STEP) as usize) * 3,
        }
    }

    /// Generate segments until the frontier passes `target_x`. A target behind
    /// the frontier is a no-op. Never fails; the walk is clamped throughout.
    pub fn extend_to(&mut self, target_x: f64, params: &LevelParams, rng: &mut Pcg32) {
        while self.last_x < target_x {
            let bias = (1.0 - self.height_bias / 100.0) * self.last_y / self.base_height;
            self.slope += (rng.random::<f64>() - bias) * self.difficulty;
            self.slope = self.slope.clamp(-params.max_slope, params.max_slope);

            let rise = self.slope * self.slope.abs().powf(self.irregularity) * STEP;
            let new_y = self.last_y + rise.round();

            let seg = Segment::new(
                DVec2::new(self.last_x, self.last_y),
                DVec2::new(self.last_x + STEP, new_y),
            );
            self.rasterize(&seg);
            self.segments.push_back(seg);

            self.last_y = new_y;
            self.last_x += STEP;

            if self.segments.len() > self.max_segments {
                self.prune();
            }

            self.difficulty += params.difficulty_increment;
            self.irregularity += params.irregularity_increment;
            if self.height_bias < 0.5 {
                self.height_bias += params.height_bias_increment;
            }
        }
    }

    /// Drop the oldest segment and every height column behind the window.
    fn prune(&mut self) {
        self.segments.pop_front();
        let Some(first) = self.segments.front() else {
            return;
        };
        let keep_from = (first.x_min() / CELL) as i64 - PRUNE_KEEP_MARGIN_COLS;
        self.height_at_col.retain(|&col, _| col >= keep_from);
        trace!("terrain pruned, window starts at col {keep_from}");
    }

    /// Store the ground row for every integer column spanned by the segment.
    fn rasterize(&mut self, seg: &Segment) {
        let col1 = (seg.p1.x / CELL) as i64;
        let col2 = (seg.p2.x / CELL) as i64;

        let dx = seg.p2.x - seg.p1.x;
        if dx == 0.0 {
            let row = (seg.p1.y / CELL + 0.5).floor() as i64;
            self.height_at_col.insert(col1, row);
            return;
        }

        let dy = seg.p2.y - seg.p1.y;
        for col in col1..=col2 {
            let wx = col as f64 * CELL;
            let t = ((wx - seg.p1.x) / dx).clamp(0.0, 1.0);
            let wy = seg.p1.y + t * dy;
            let row = (wy / CELL + 0.5).floor() as i64;
            self.height_at_col.insert(col, row);
        }
    }

    /// Ground row at a column: exact lookup, else the nearest known column
    /// within ±8. `None` means no terrain is known near there yet.
    pub fn ground_row_near(&self, col: i64) -> Option<i64> {
        if let Some(&row) = self.height_at_col.get(&col) {
            return Some(row);
        }
        for d in 1..=GROUND_PROBE_COLS {
            if let Some(&row) = self.height_at_col.get(&(col - d)) {
                return Some(row);
            }
            if let Some(&row) = self.height_at_col.get(&(col + d)) {
                return Some(row);
            }
        }
        None
    }

    /// Surface tangent angle near a world x, from the ground rows one column
    /// to either side. Flat (0) when the terrain there is unknown.
    pub fn tangent_angle_at(&self, wx: f64) -> f64 {
        let col = (wx / CELL) as i64;
        let (Some(left), Some(right)) = (
            self.ground_row_near(col - 1),
            self.ground_row_near(col + 1),
        ) else {
            return 0.0;
        };
        let dy_cells = (right - left) as f64;
        (-dy_cells).atan2(2.0)
    }

    /// Retained segments in increasing-x order (for contact tests and rendering).
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn max_segments(&self) -> usize {
        self.max_segments
    }

    /// Left edge of the retained window.
    pub fn leftmost_x(&self) -> f64 {
        self.segments.front().map_or(0.0, |s| s.x_min())
    }

    /// Generation frontier; nothing exists to the right of this x yet.
    pub fn frontier_x(&self) -> f64 {
        self.last_x
    }

    #[cfg(test)]
    pub(crate) fn height_columns(&self) -> impl Iterator<Item = i64> + '_ {
        self.height_at_col.keys().copied()
    }

    /// Fixed course for unit tests, bypassing the generator.
    #[cfg(test)]
    pub(crate) fn from_segments_for_test(segs: Vec<Segment>) -> Self {
        let params = crate::tuning::stage_params(0);
        let mut t = Self::new(params, 1280.0, 720.0);
        for seg in segs {
            t.rasterize(&seg);
            t.last_x = seg.p2.x;
            t.last_y = seg.p2.y;
            t.segments.push_back(seg);
        }
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::stage_params;
    use rand::SeedableRng;

    fn stream() -> (TerrainStream, Pcg32) {
        let params = stage_params(0);
        (
            TerrainStream::new(params, 1280.0, 720.0),
            Pcg32::seed_from_u64(7),
        )
    }

    #[test]
    fn test_extend_reaches_target() {
        let (mut t, mut rng) = stream();
        t.extend_to(1300.0, stage_params(0), &mut rng);
        assert!(t.frontier_x() >= 1300.0);
        assert!(t.segment_count() > 0);
    }

    #[test]
    fn test_extend_behind_frontier_is_noop() {
        let (mut t, mut rng) = stream();
        t.extend_to(400.0, stage_params(0), &mut rng);
        let count = t.segment_count();
        let frontier = t.frontier_x();
        t.extend_to(100.0, stage_params(0), &mut rng);
        assert_eq!(t.segment_count(), count);
        assert_eq!(t.frontier_x(), frontier);
    }

    #[test]
    fn test_window_bound_holds() {
        let (mut t, mut rng) = stream();
        // Push the frontier far past several prune cycles
        t.extend_to(60_000.0, stage_params(0), &mut rng);
        assert!(t.segment_count() <= t.max_segments());

        let first_col = (t.leftmost_x() / CELL) as i64 - PRUNE_KEEP_MARGIN_COLS;
        let last_col = (t.frontier_x() / CELL) as i64 + 1;
        for col in t.height_columns() {
            assert!(col >= first_col && col <= last_col, "stale column {col}");
        }
    }

    #[test]
    fn test_slope_clamp_bounds_rises() {
        let params = stage_params(0); // max_slope 1.0
        let mut t = TerrainStream::new(params, 1280.0, 720.0);
        let mut rng = Pcg32::seed_from_u64(99);
        t.extend_to(20_000.0, params, &mut rng);

        let cap = STEP * params.max_slope + 0.5; // rounding slack
        for seg in t.segments() {
            assert!((seg.p2.y - seg.p1.y).abs() <= cap);
        }
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let params = stage_params(2);
        let mut a = TerrainStream::new(params, 1280.0, 720.0);
        let mut b = TerrainStream::new(params, 1280.0, 720.0);
        let mut rng_a = Pcg32::seed_from_u64(1234);
        let mut rng_b = Pcg32::seed_from_u64(1234);
        a.extend_to(5000.0, params, &mut rng_a);
        b.extend_to(5000.0, params, &mut rng_b);

        let pa: Vec<_> = a.segments().collect();
        let pb: Vec<_> = b.segments().collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_ground_probe_and_tangent() {
        let (mut t, mut rng) = stream();
        t.extend_to(800.0, stage_params(0), &mut rng);

        let col = (400.0 / CELL) as i64;
        assert!(t.ground_row_near(col).is_some());
        // Far ahead of generation nothing is known
        assert!(t.ground_row_near(1_000_000).is_none());
        assert_eq!(t.tangent_angle_at(1e9), 0.0);
        assert!(t.tangent_angle_at(400.0).is_finite());
    }
}
