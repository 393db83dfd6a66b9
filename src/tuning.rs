//! Per-stage parameter tables
//!
//! Every stage (meadow, desert, ...) tunes gravity, surface response and the
//! terrain generator differently. The tables live here as plain data and are
//! passed explicitly into every simulation step; nothing reads them from
//! shared global state.

use serde::Serialize;

/// Physics and terrain-generation parameters for one stage.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LevelParams {
    pub name: &'static str,
    /// Downward acceleration per tick
    pub gravity: f64,
    /// Per-tick velocity decay factor while airborne or grounded
    pub air_resistance: f64,
    /// Normal-velocity retention on soft contact (settling only, see wheel step)
    pub restitution: f64,
    /// Tangential velocity loss per grounded tick
    pub friction: f64,
    /// Drive-force multiplier for the stage surface
    pub traction: f64,
    /// Clamp on the terrain generator's slope random walk
    pub max_slope: f64,
    pub difficulty_init: f64,
    pub difficulty_increment: f64,
    pub irregularity_init: f64,
    pub irregularity_increment: f64,
    /// Height-bias term steering the random walk back toward mid-screen
    pub height_bias_init: f64,
    pub height_bias_increment: f64,
}

/// All playable stages, selected by index.
pub const STAGES: [LevelParams; 6] = [
    LevelParams {
        name: "MEADOW",
        gravity: 0.08,
        air_resistance: 0.0005,
        restitution: 0.8,
        friction: 0.003,
        traction: 1.0,
        max_slope: 1.0,
        difficulty_init: 0.005,
        difficulty_increment: 0.0001,
        irregularity_init: 0.01,
        irregularity_increment: 0.00001,
        height_bias_init: 10.0,
        height_bias_increment: 0.001,
    },
    LevelParams {
        name: "DESERT",
        gravity: 0.08,
        air_resistance: 0.0003,
        restitution: 0.5,
        friction: 0.03,
        traction: 1.25,
        max_slope: 1.5,
        difficulty_init: 0.005,
        difficulty_increment: 0.0002,
        irregularity_init: 0.001,
        irregularity_increment: 0.000001,
        height_bias_init: 10.0,
        height_bias_increment: 0.002,
    },
    LevelParams {
        name: "TUNDRA",
        gravity: 0.08,
        air_resistance: 0.0007,
        restitution: 0.8,
        friction: 0.0001,
        traction: 0.5,
        max_slope: 0.8,
        difficulty_init: 0.008,
        difficulty_increment: 0.0001,
        irregularity_init: 0.01,
        irregularity_increment: 0.00003,
        height_bias_init: 10.0,
        height_bias_increment: 0.001,
    },
    LevelParams {
        name: "LUNAR",
        gravity: 0.04,
        air_resistance: 0.00001,
        restitution: 0.7,
        friction: 0.001,
        traction: 0.5,
        max_slope: 2.0,
        difficulty_init: 0.01,
        difficulty_increment: 0.0003,
        irregularity_init: 0.05,
        irregularity_increment: 0.0001,
        height_bias_init: 20.0,
        height_bias_increment: 0.002,
    },
    LevelParams {
        name: "MARTIAN",
        gravity: 0.06,
        air_resistance: 0.00005,
        restitution: 0.07,
        friction: 0.03,
        traction: 0.75,
        max_slope: 1.5,
        difficulty_init: 0.008,
        difficulty_increment: 0.0002,
        irregularity_init: 0.02,
        irregularity_increment: 0.00005,
        height_bias_init: 10.0,
        height_bias_increment: 0.002,
    },
    LevelParams {
        name: "NIGHTLIFE",
        gravity: 0.08,
        air_resistance: 0.0007,
        restitution: 0.5,
        friction: 0.03,
        traction: 1.5,
        max_slope: 0.5,
        difficulty_init: 0.001,
        difficulty_increment: 0.0001,
        irregularity_init: 0.05,
        irregularity_increment: 0.0001,
        height_bias_init: 5.0,
        height_bias_increment: 0.0005,
    },
];

/// Parameters for a stage index; out-of-range indices clamp to the last stage.
pub fn stage_params(index: usize) -> &'static LevelParams {
    &STAGES[index.min(STAGES.len() - 1)]
}
