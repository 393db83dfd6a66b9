//! Nitro booster: a timed thrust state machine
//!
//! Idle -> Active on trigger (fuel available, cooldown elapsed); Active ->
//! Idle on release, fuel exhaustion or expiry, arming a cooldown window.
//! While active it adds a fixed per-tick thrust impulse along the vehicle
//! tangent and clamps altitude to a ceiling computed at launch.

use glam::DVec2;
use log::debug;
use serde::{Deserialize, Serialize};

use super::terrain::TerrainStream;
use super::wheel::Wheel;
use crate::consts::*;

/// State-machine edge taken by [`NitroBooster::update`] this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NitroTransition {
    Engaged,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NitroBooster {
    active: bool,
    end_time: f64,
    cooldown_until: f64,
    /// Launch direction captured at engagement (fallback when the axle is degenerate)
    dir: DVec2,
    /// Altitude ceiling in world y (y-down: smaller is higher)
    ceiling_y: f64,
}

impl Default for NitroBooster {
    fn default() -> Self {
        Self {
            active: false,
            end_time: 0.0,
            cooldown_until: 0.0,
            dir: DVec2::X,
            ceiling_y: f64::MIN,
        }
    }
}

impl NitroBooster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive the state machine. `fuel` only gates engagement; depletion is the
    /// host's concern. `avg_x` is the vehicle's average x, used to sample the
    /// terrain tangent for the launch direction and the ground for the ceiling.
    pub fn update(
        &mut self,
        trigger: bool,
        fuel: f64,
        now: f64,
        avg_x: f64,
        terrain: &TerrainStream,
    ) -> Option<NitroTransition> {
        if !self.active {
            if trigger && fuel > 0.0 && now >= self.cooldown_until {
                self.active = true;
                self.end_time = now + NITRO_DURATION;

                let launch_angle = terrain.tangent_angle_at(avg_x) + NITRO_LAUNCH_BIAS;
                self.dir = DVec2::new(launch_angle.cos(), launch_angle.sin());

                let col = (avg_x / CELL) as i64;
                let ground_row = terrain.ground_row_near(col).unwrap_or(0) as f64;
                self.ceiling_y = (ground_row - NITRO_MAX_ALT_CELLS) * CELL;

                debug!("nitro engaged until t={:.2}", self.end_time);
                return Some(NitroTransition::Engaged);
            }
        } else if !trigger || fuel <= 0.0 || now >= self.end_time {
            self.active = false;
            self.cooldown_until = now + NITRO_COOLDOWN;
            debug!("nitro expired, cooldown until t={:.2}", self.cooldown_until);
            return Some(NitroTransition::Expired);
        }
        None
    }

    /// Add the thrust impulse to every wheel and clamp to the altitude
    /// ceiling. No-op unless active.
    pub fn apply_thrust(&self, wheels: &mut [Wheel]) {
        if !self.active {
            return;
        }

        // tangent from the first two wheels; launch direction when degenerate
        let mut dir = self.dir;
        if wheels.len() >= 2 {
            let back = wheels[0].pos;
            let front = wheels[1].pos;
            let dx = front.x - back.x;
            let dy_up = back.y - front.y;
            let len = (dx * dx + dy_up * dy_up).sqrt();
            if len > 1e-6 {
                dir = DVec2::new(dx / len, dy_up / len);
            }
        }

        for w in wheels {
            w.vel += NITRO_THRUST * dir;
            if w.pos.y < self.ceiling_y {
                w.pos.y = self.ceiling_y;
                if w.vel.y > 0.0 {
                    w.vel.y = 0.0;
                }
            }
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    /// Seconds of thrust (while active) or cooldown (while idle) remaining.
    pub fn remaining(&self, now: f64) -> f64 {
        if self.active {
            (self.end_time - now).max(0.0)
        } else {
            (self.cooldown_until - now).max(0.0)
        }
    }

    pub fn cooldown_until(&self) -> f64 {
        self.cooldown_until
    }
}
