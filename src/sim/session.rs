//! Simulation session: owns all mutable state and orchestrates the tick
//!
//! One session is one round. It owns the terrain window, the wheel arena, the
//! chassis, the booster and the RNG; resetting a round reconstructs the whole
//! session. Hosts call [`Session::tick`] on a steady clock with a clamped
//! wall-clock delta and read back poses, terrain and events.

use log::debug;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::chassis::{Attachment, Chassis};
use super::flip::FlipTracker;
use super::nitro::{NitroBooster, NitroTransition};
use super::terrain::TerrainStream;
use super::wheel::{self, Wheel};
use crate::consts::*;
use crate::tuning::{LevelParams, stage_params};

/// Driver intents for a single tick (deterministic).
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub accelerate: bool,
    pub brake: bool,
    pub nitro: bool,
    /// Remaining fuel; gates nitro engagement only, depletion is external
    pub fuel: f64,
}

/// Things that happened during a tick, for the host to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// One-shot: a kill-switch probe touched terrain and the vehicle died
    VehicleKilled,
    NitroEngaged,
    NitroExpired,
    FlipCompleted { clockwise: bool },
}

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub stage: usize,
    pub seed: u64,
    /// Viewport dimensions; size the terrain window and the generator bias
    pub view_width: f64,
    pub view_height: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stage: 0,
            seed: 0,
            view_width: 1280.0,
            view_height: 720.0,
        }
    }
}

/// Serializable view of a session for state dumps.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot<'a> {
    pub stage: usize,
    pub seed: u64,
    pub elapsed: f64,
    pub wheels: &'a [Wheel],
    pub chassis: &'a Chassis,
    pub nitro_active: bool,
    pub flips: u32,
    pub distance_cells: f64,
}

pub struct Session {
    config: SessionConfig,
    params: &'static LevelParams,
    rng: Pcg32,
    terrain: TerrainStream,
    wheels: Vec<Wheel>,
    chassis: Chassis,
    booster: NitroBooster,
    flips: FlipTracker,
    elapsed: f64,
    start_x: f64,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let params = stage_params(config.stage);
        let mut rng = Pcg32::seed_from_u64(config.seed);

        let mut terrain = TerrainStream::new(params, config.view_width, config.view_height);
        terrain.extend_to(config.view_width + STEP, params, &mut rng);

        let (wheels, chassis) = spawn_vehicle();
        let start_x = average_x(&wheels);
        debug!(
            "session start: stage {} ({}), seed {}",
            config.stage, params.name, config.seed
        );

        Self {
            config,
            params,
            rng,
            terrain,
            wheels,
            chassis,
            booster: NitroBooster::new(),
            flips: FlipTracker::new(),
            elapsed: 0.0,
            start_x,
        }
    }

    /// Tear down and rebuild the round. No partial teardown paths exist.
    pub fn reset(&mut self, config: SessionConfig) {
        *self = Session::new(config);
    }

    /// Advance one simulation step. `dt_seconds` is clamped to a safe range
    /// and feeds only the booster's wall clock; the integrator itself assumes
    /// a roughly fixed step.
    pub fn tick(&mut self, input: &TickInput, dt_seconds: f64) -> Vec<SimEvent> {
        let dt = dt_seconds.clamp(MIN_TICK_DT, MAX_TICK_DT);
        self.elapsed += dt;

        let mut events = Vec::new();

        // keep terrain generated well past the vehicle; after a crash the
        // window tracks the wreck, not wheels sent ballistic by the kill
        let frontier_target = self.tracked_x() + self.config.view_width * 2.0;
        self.terrain
            .extend_to(frontier_target, self.params, &mut self.rng);

        let avg_x = average_x(&self.wheels);
        match self.booster.update(
            input.nitro,
            input.fuel,
            self.elapsed,
            avg_x,
            &self.terrain,
        ) {
            Some(NitroTransition::Engaged) => events.push(SimEvent::NitroEngaged),
            Some(NitroTransition::Expired) => events.push(SimEvent::NitroExpired),
            None => {}
        }
        let nitro_active = self.booster.active();
        // the booster overrides the pedals: no drive or brake while it burns
        let accelerating = input.accelerate && !nitro_active;
        let braking = input.brake && !nitro_active;

        for i in 0..self.wheels.len() {
            wheel::step(
                &mut self.wheels,
                i,
                self.params,
                &self.terrain,
                accelerating,
                braking,
                nitro_active,
            );
        }

        let killed = self.chassis.step(
            self.params,
            &self.terrain,
            &mut self.wheels,
            &mut self.rng,
            accelerating,
            braking,
        );
        if killed {
            events.push(SimEvent::VehicleKilled);
        }

        self.booster.apply_thrust(&mut self.wheels);

        if self.chassis.alive {
            let (cw, ccw) = self.flips.update(self.chassis.angle);
            for _ in 0..cw {
                events.push(SimEvent::FlipCompleted { clockwise: true });
            }
            for _ in 0..ccw {
                events.push(SimEvent::FlipCompleted { clockwise: false });
            }
        }

        events
    }

    // === queries for hosts ===

    pub fn wheels(&self) -> &[Wheel] {
        &self.wheels
    }

    pub fn chassis(&self) -> &Chassis {
        &self.chassis
    }

    pub fn terrain(&self) -> &TerrainStream {
        &self.terrain
    }

    pub fn booster(&self) -> &NitroBooster {
        &self.booster
    }

    pub fn flips(&self) -> &FlipTracker {
        &self.flips
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn alive(&self) -> bool {
        self.chassis.alive
    }

    pub fn average_x(&self) -> f64 {
        average_x(&self.wheels)
    }

    pub fn average_speed(&self) -> f64 {
        if self.wheels.is_empty() {
            return 0.0;
        }
        self.wheels.iter().map(Wheel::speed).sum::<f64>() / self.wheels.len() as f64
    }

    /// Forward progress since spawn, in terrain cells.
    pub fn distance_cells(&self) -> f64 {
        ((self.average_x() - self.start_x) / CELL).max(0.0)
    }

    /// Toppled-pose test on the rear-to-front axle direction.
    pub fn is_flipped(&self) -> bool {
        if self.wheels.len() < 2 {
            return false;
        }
        let d = self.wheels[1].pos - self.wheels[0].pos;
        let len = d.length() + 1e-9;
        let cos = d.x / len;
        let sin = d.y / len;
        cos <= FLIPPED_COS_MIN && sin.abs() <= FLIPPED_SIN_MAX
    }

    /// True when any kill-switch probe sits within half a cell of the ground
    /// (hosts use this to arm game-over while the wreck comes to rest).
    pub fn roof_contact(&self) -> bool {
        let tol = 0.5 * CELL;
        for probe in self.chassis.world_kill_switches() {
            let col = (probe.x / CELL).round() as i64;
            if let Some(row) = self.terrain.ground_row_near(col) {
                if probe.y >= row as f64 * CELL - tol {
                    return true;
                }
            }
        }
        false
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            stage: self.config.stage,
            seed: self.config.seed,
            elapsed: self.elapsed,
            wheels: &self.wheels,
            chassis: &self.chassis,
            nitro_active: self.booster.active(),
            flips: self.flips.total(),
            distance_cells: self.distance_cells(),
        }
    }

    /// X the terrain window tracks: the rightmost living wheel while driving,
    /// the chassis once a crash has detached every wheel.
    fn tracked_x(&self) -> f64 {
        let rightmost_alive = self
            .wheels
            .iter()
            .filter(|w| w.alive)
            .map(|w| w.pos.x)
            .fold(f64::NEG_INFINITY, f64::max);
        if rightmost_alive.is_finite() {
            rightmost_alive
        } else {
            self.chassis.center.x
        }
    }
}

fn average_x(wheels: &[Wheel]) -> f64 {
    if wheels.is_empty() {
        return 0.0;
    }
    wheels.iter().map(|w| w.pos.x).sum::<f64>() / wheels.len() as f64
}

/// Stock vehicle: rear and front drive wheels plus a zero-radius mid
/// stabilizer, linked rear->front, mid->front, rear->mid, with the chassis
/// hung above the wheel centroid.
fn spawn_vehicle() -> (Vec<Wheel>, Chassis) {
    let mut wheels = vec![
        Wheel::new(WHEEL_REAR, WHEEL_REAR_R),
        Wheel::new(WHEEL_FRONT, WHEEL_FRONT_R),
        Wheel::new(WHEEL_MID, WHEEL_MID_R),
    ];
    wheel::attach(&mut wheels, 0, 1);
    wheel::attach(&mut wheels, 2, 1);
    wheel::attach(&mut wheels, 0, 2);

    let chassis = Chassis::build(
        &CAR_BODY_POINTS,
        &CAR_HITBOX_POINTS,
        &CAR_KILL_POINTS,
        vec![
            Attachment {
                points: CAR_GLASS_POINTS.to_vec(),
                color: CAR_GLASS_COLOR,
            },
            Attachment {
                points: CAR_HANDLE_POINTS.to_vec(),
                color: CAR_HANDLE_COLOR,
            },
        ],
        &wheels,
    );

    (wheels, chassis)
}
