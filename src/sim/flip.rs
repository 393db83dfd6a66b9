//! Flip tracking: counts full rotations of the vehicle
//!
//! Accumulates wrapped per-tick angle deltas; every accumulated ±2π is one
//! completed counter-clockwise/clockwise flip. Pure bookkeeping, no physics.

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlipTracker {
    initialized: bool,
    last_angle: f64,
    accum: f64,
    cw: u32,
    ccw: u32,
}

impl FlipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current chassis angle; returns flips completed this tick as
    /// `(clockwise, counter_clockwise)` counts.
    pub fn update(&mut self, angle_rad: f64) -> (u32, u32) {
        if !self.initialized {
            self.initialized = true;
            self.last_angle = angle_rad;
            self.accum = 0.0;
            return (0, 0);
        }

        let mut delta = angle_rad - self.last_angle;
        while delta > PI {
            delta -= TAU;
        }
        while delta <= -PI {
            delta += TAU;
        }
        self.accum += delta;
        self.last_angle = angle_rad;

        let mut cw = 0;
        let mut ccw = 0;
        while self.accum >= TAU {
            self.accum -= TAU;
            self.ccw += 1;
            ccw += 1;
        }
        while self.accum <= -TAU {
            self.accum += TAU;
            self.cw += 1;
            cw += 1;
        }
        (cw, ccw)
    }

    pub fn cw(&self) -> u32 {
        self.cw
    }

    pub fn ccw(&self) -> u32 {
        self.ccw
    }

    pub fn total(&self) -> u32 {
        self.cw + self.ccw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_ccw_rotation_counts_once() {
        let mut flips = FlipTracker::new();
        let steps = 128;
        for i in 0..=steps + 2 {
            // feed wrapped angles the way a chassis would report them
            let angle = crate::normalize_angle(i as f64 * TAU / steps as f64);
            flips.update(angle);
        }
        assert_eq!(flips.ccw(), 1);
        assert_eq!(flips.cw(), 0);
        assert_eq!(flips.total(), 1);
    }

    #[test]
    fn test_rocking_never_awards() {
        let mut flips = FlipTracker::new();
        for i in 0..1000 {
            let angle = (i as f64 * 0.3).sin(); // oscillates within ±1 rad
            flips.update(angle);
        }
        assert_eq!(flips.total(), 0);
    }

    #[test]
    fn test_cw_rotation_counts() {
        let mut flips = FlipTracker::new();
        let steps = 90;
        for i in 0..=2 * steps + 2 {
            let angle = crate::normalize_angle(-(i as f64) * TAU / steps as f64);
            flips.update(angle);
        }
        assert_eq!(flips.cw(), 2);
        assert_eq!(flips.ccw(), 0);
    }
}
