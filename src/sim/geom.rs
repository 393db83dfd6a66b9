//! Terrain segment geometry
//!
//! A [`Segment`] is one edge of the terrain polyline with its slope and
//! intercept cached at construction, so per-tick contact tests are O(1)
//! arithmetic with no repeated division.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Sentinel slope used for vertical segments (zero run)
pub const VERTICAL_SLOPE: f64 = 1e9;

/// A terrain edge with cached line coefficients `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub p1: DVec2,
    pub p2: DVec2,
    slope: f64,
    intercept: f64,
}

impl Segment {
    pub fn new(p1: DVec2, p2: DVec2) -> Self {
        let run = p2.x - p1.x;
        let slope = if run == 0.0 {
            VERTICAL_SLOPE
        } else {
            (p2.y - p1.y) / run
        };
        let intercept = p1.y - slope * p1.x;
        Self {
            p1,
            p2,
            slope,
            intercept,
        }
    }

    #[inline]
    pub fn slope(&self) -> f64 {
        self.slope
    }

    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[inline]
    pub fn x_min(&self) -> f64 {
        self.p1.x.min(self.p2.x)
    }

    #[inline]
    pub fn x_max(&self) -> f64 {
        self.p1.x.max(self.p2.x)
    }

    /// Perpendicular distance from a point to the segment's carrier line.
    #[inline]
    pub fn distance_to(&self, p: DVec2) -> f64 {
        (self.slope * p.x - p.y + self.intercept).abs() / (self.slope * self.slope + 1.0).sqrt()
    }

    /// X coordinate of the foot of the perpendicular dropped from `p`.
    #[inline]
    pub fn foot_x(&self, p: DVec2) -> f64 {
        (self.slope * (p.y - self.intercept) + p.x) / (self.slope * self.slope + 1.0)
    }

    /// Y on the carrier line at a given x.
    #[inline]
    pub fn y_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Angle that rotates world velocities into the segment's tangent frame.
    #[inline]
    pub fn tangent_angle(&self) -> f64 {
        -self.slope.atan()
    }

    /// True when the perpendicular foot of `p` lies within the segment's x
    /// span, widened by `margin` on both sides.
    #[inline]
    pub fn foot_in_span(&self, p: DVec2, margin: f64) -> bool {
        let foot = self.foot_x(p);
        foot >= self.x_min() - margin && foot <= self.x_max() + margin
    }
}
