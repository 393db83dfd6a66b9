//! Hillrun - a side-scrolling driving-game simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, wheels, chassis, nitro)
//! - `tuning`: Per-stage parameter tables (data-driven balance)
//!
//! The crate is a pure in-process library: no rendering, input devices or
//! audio. A host drives [`sim::Session::tick`] on a steady clock and reads
//! back poses, terrain segments and events for presentation.

pub mod sim;
pub mod tuning;

pub use sim::{Session, SessionConfig, SimEvent, TickInput};
pub use tuning::{LevelParams, stage_params};

use glam::DVec2;

/// Game configuration constants
pub mod consts {
    use glam::DVec2;

    /// Fixed simulation timestep the tuning below is calibrated for (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Clamp range for the per-tick wall-clock delta fed to [`crate::sim::Session::tick`]
    pub const MIN_TICK_DT: f64 = 0.001;
    pub const MAX_TICK_DT: f64 = 0.033;

    /// Side of one sprite cell in world units (terrain columns are indexed in cells)
    pub const CELL: f64 = 6.0;
    /// Horizontal span of one terrain segment in world units
    pub const STEP: f64 = 20.0;

    /// Vehicle tuning (stage-independent)
    pub const MAX_VELOCITY: f64 = 30.0;
    pub const ACCELERATION: f64 = 0.8;
    pub const DECELERATION: f64 = 0.8;
    pub const SPRING_CONSTANT: f64 = 0.6;
    pub const DAMPING: f64 = 0.06;
    pub const ANGULAR_ACCELERATION: f64 = 0.0010;
    pub const ANGULAR_DECELERATION: f64 = 0.0010;
    pub const ANGULAR_DAMPING: f64 = 0.05;
    pub const MAX_ANGULAR_VELOCITY: f64 = 0.04;

    /// Below this tangential speed a grounded wheel is considered creeping
    /// and its velocity is zeroed instead of attenuated.
    pub const CREEP_THRESHOLD: f64 = MAX_VELOCITY / 1000.0;

    /// Wheel spawn layout: rear / front / mid (the mid "wheel" is a zero-radius
    /// stabilizer that only participates in the spring network)
    pub const WHEEL_REAR: DVec2 = DVec2::new(100.0, 300.0);
    pub const WHEEL_REAR_R: f64 = 20.0;
    pub const WHEEL_FRONT: DVec2 = DVec2::new(220.0, 300.0);
    pub const WHEEL_FRONT_R: f64 = 20.0;
    pub const WHEEL_MID: DVec2 = DVec2::new(160.0, 300.0);
    pub const WHEEL_MID_R: f64 = 0.0;

    /// Chassis contact probes use a fixed radius and clearance
    pub const PROBE_RADIUS: f64 = 4.0;
    pub const PROBE_CLEARANCE: f64 = 4.0;

    /// Nitro booster
    pub const NITRO_MAX_ALT_CELLS: f64 = 2048.0;
    pub const NITRO_THRUST: f64 = 0.25;
    pub const NITRO_DURATION: f64 = 1.5;
    pub const NITRO_COOLDOWN: f64 = 2.0;
    /// Upward bias added to the terrain tangent when computing the launch direction
    pub const NITRO_LAUNCH_BIAS: f64 = std::f64::consts::PI / 3.0;

    /// Toppled-pose test thresholds on the rear-to-front axle direction
    pub const FLIPPED_COS_MIN: f64 = -0.90;
    pub const FLIPPED_SIN_MAX: f64 = 0.35;

    /// Chassis outline in sprite-local coordinates (centered at build time)
    pub const CAR_BODY_POINTS: [DVec2; 21] = [
        DVec2::new(0.0, 0.0),
        DVec2::new(0.0, 31.0),
        DVec2::new(9.0, 37.0),
        DVec2::new(15.0, 19.0),
        DVec2::new(44.0, 19.0),
        DVec2::new(50.0, 37.0),
        DVec2::new(138.0, 37.0),
        DVec2::new(144.0, 19.0),
        DVec2::new(172.0, 19.0),
        DVec2::new(179.0, 37.0),
        DVec2::new(188.0, 31.0),
        DVec2::new(181.0, 6.0),
        DVec2::new(137.0, 0.0),
        DVec2::new(112.0, -25.0),
        DVec2::new(62.0, -25.0),
        DVec2::new(37.0, -6.0),
        DVec2::new(25.0, -7.0),
        DVec2::new(19.0, -19.0),
        DVec2::new(4.0, -21.0),
        DVec2::new(1.0, -15.0),
        DVec2::new(12.0, -10.0),
    ];

    /// Probes along the bumpers and underbody that collide with terrain
    pub const CAR_HITBOX_POINTS: [DVec2; 5] = [
        DVec2::new(15.0, 6.0),
        DVec2::new(173.0, 1.0),
        DVec2::new(137.0, 0.0),
        DVec2::new(1.0, -15.0),
        DVec2::new(12.0, -10.0),
    ];

    /// Roof probes; terrain contact here ends the run
    pub const CAR_KILL_POINTS: [DVec2; 2] = [DVec2::new(112.0, -25.0), DVec2::new(62.0, -25.0)];

    pub const CAR_GLASS_POINTS: [DVec2; 4] = [
        DVec2::new(60.0, 6.0),
        DVec2::new(70.0, -18.0),
        DVec2::new(116.0, -18.0),
        DVec2::new(140.0, 6.0),
    ];
    pub const CAR_GLASS_COLOR: [u8; 3] = [20, 20, 20];

    pub const CAR_HANDLE_POINTS: [DVec2; 4] = [
        DVec2::new(96.0, 10.0),
        DVec2::new(102.0, 10.0),
        DVec2::new(102.0, 13.0),
        DVec2::new(96.0, 13.0),
    ];
    pub const CAR_HANDLE_COLOR: [u8; 3] = [40, 40, 40];
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f64) -> f64 {
    use std::f64::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Rotate a point about the origin by `angle` radians
#[inline]
pub fn rotate_point(p: DVec2, angle: f64) -> DVec2 {
    let (sin, cos) = angle.sin_cos();
    DVec2::new(p.x * cos - p.y * sin, p.x * sin + p.y * cos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - (-PI)).abs() < 1e-12);
        assert!((normalize_angle(-3.0 * PI) - (-PI)).abs() < 1e-12);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_point_quarter_turn() {
        let p = rotate_point(DVec2::new(1.0, 0.0), PI / 2.0);
        assert!(p.x.abs() < 1e-12);
        assert!((p.y - 1.0).abs() < 1e-12);
    }
}
