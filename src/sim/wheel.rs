//! Rigid wheel integration and suspension links
//!
//! A wheel is a circular point mass. Per tick it integrates gravity and drag,
//! resolves contact against every retained terrain segment (push-out plus a
//! tangent-frame velocity split), and applies its spring-damper links to
//! partner wheels. The designated axle root additionally owns the coupled
//! rotation of the wheel pair, which is how wheelie tilt emerges without an
//! angular-inertia solve.
//!
//! Wheels reference each other by index into the session's wheel arena; there
//! are no cross-references to invalidate when a vehicle dies or resets.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::terrain::TerrainStream;
use crate::consts::*;
use crate::tuning::LevelParams;

/// A spring-damper constraint toward another wheel, held at `rest_distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuspensionLink {
    pub partner: usize,
    pub rest_distance: f64,
}

/// A circular point mass.
///
/// Position is in world space (y down); velocity y is up-positive, see the
/// module docs in [`crate::sim`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wheel {
    pub pos: DVec2,
    pub vel: DVec2,
    pub radius: f64,
    pub alive: bool,
    /// Axle-pair angular velocity; only meaningful on the root
    pub omega: f64,
    pub is_root: bool,
    pub links: Vec<SuspensionLink>,
}

impl Wheel {
    pub fn new(pos: DVec2, radius: f64) -> Self {
        Self {
            pos,
            vel: DVec2::ZERO,
            radius,
            alive: true,
            omega: 0.0,
            is_root: false,
            links: Vec::new(),
        }
    }

    /// Drop all constraints and mark the wheel dead (ballistic from here on).
    pub fn kill(&mut self) {
        self.links.clear();
        self.alive = false;
    }

    pub fn speed(&self) -> f64 {
        self.vel.length()
    }
}

/// Link `root` to `partner` at their current distance. The first wheel of a
/// link becomes the axle root that owns rotation coupling.
pub fn attach(wheels: &mut [Wheel], root: usize, partner: usize) {
    let rest_distance = wheels[root].pos.distance(wheels[partner].pos);
    wheels[root].links.push(SuspensionLink {
        partner,
        rest_distance,
    });
    wheels[root].is_root = true;
    wheels[partner].is_root = false;
}

/// Two disjoint mutable wheels out of the arena.
fn pair_mut(wheels: &mut [Wheel], a: usize, b: usize) -> (&mut Wheel, &mut Wheel) {
    debug_assert_ne!(a, b);
    if a < b {
        let (lo, hi) = wheels.split_at_mut(b);
        (&mut lo[a], &mut hi[0])
    } else {
        let (lo, hi) = wheels.split_at_mut(a);
        (&mut hi[0], &mut lo[b])
    }
}

/// Advance wheel `i` by one tick.
pub fn step(
    wheels: &mut [Wheel],
    i: usize,
    params: &LevelParams,
    terrain: &TerrainStream,
    accelerating: bool,
    braking: bool,
    nitro: bool,
) {
    integrate_and_collide(&mut wheels[i], params, terrain, accelerating, braking);

    if wheels[i].is_root && !wheels[i].links.is_empty() {
        rotate_axle_pair(wheels, i, accelerating, braking, nitro);
    }

    apply_links(wheels, i);
}

fn integrate_and_collide(
    w: &mut Wheel,
    params: &LevelParams,
    terrain: &TerrainStream,
    accelerating: bool,
    braking: bool,
) {
    // one-tick-delayed explicit Euler; y velocity is up-positive
    w.pos.x += w.vel.x;
    w.pos.y -= w.vel.y;

    w.vel.y -= params.gravity;
    w.vel *= 1.0 - params.air_resistance;

    let contact_radius = w.radius.max(1.0);

    for seg in terrain.segments() {
        let dist = seg.distance_to(w.pos);
        if dist >= contact_radius || !seg.foot_in_span(w.pos, 0.0) {
            continue;
        }

        // push out of the ground along the segment normal
        let overlap = w.radius - dist;
        let normal_angle = (-seg.slope()).atan2(1.0);
        w.pos.y -= overlap * normal_angle.cos();
        w.pos.x -= overlap * normal_angle.sin();

        // rotate velocity into the slope frame
        let theta = seg.tangent_angle();
        let (sin_t, cos_t) = theta.sin_cos();
        let mut v_tangent = w.vel.x * cos_t + w.vel.y * sin_t;
        let mut v_normal = w.vel.y * cos_t - w.vel.x * sin_t;

        // Settling policy: restitution only attenuates small normal speeds;
        // hard impacts pass through unchanged.
        if v_normal < 0.2 {
            v_normal *= params.restitution;
        }

        if v_tangent.abs() > CREEP_THRESHOLD {
            v_tangent *= 1.0 - params.friction;
        } else {
            v_tangent = 0.0;
        }

        // drive / brake forces along the tangent
        if accelerating && w.alive && v_tangent < MAX_VELOCITY {
            v_tangent +=
                ACCELERATION * (1.0 - v_tangent / MAX_VELOCITY) * cos_t * params.traction;
        }
        if braking && w.alive && v_tangent > -MAX_VELOCITY {
            v_tangent -=
                DECELERATION * (1.0 + v_tangent / MAX_VELOCITY) * cos_t * params.traction;
        }
        // both pedals: bleed vertical velocity (burnout hold-down)
        if accelerating && braking {
            w.vel.y -= params.gravity * 0.5;
        }

        // back to world frame
        w.vel.x = v_tangent * cos_t - v_normal * sin_t;
        w.vel.y = v_tangent * sin_t + v_normal * cos_t;

        // ground contact bleeds some of the axle spin
        if w.is_root && !w.links.is_empty() {
            w.omega *= 0.9;
        }
    }
}

/// Angular control of the axle pair plus one instantaneous rigid rotation of
/// root and first partner about their shared midpoint.
fn rotate_axle_pair(
    wheels: &mut [Wheel],
    root: usize,
    accelerating: bool,
    braking: bool,
    nitro: bool,
) {
    let partner = wheels[root].links[0].partner;

    {
        let (w, other) = pair_mut(wheels, root, partner);

        if nitro {
            // straight flight: damp spin toward zero
            w.omega *= 1.0 - ANGULAR_DAMPING;
            if w.omega.abs() < 1e-4 {
                w.omega = 0.0;
            }
        } else if accelerating && braking {
            // both pedals: steer the pair back toward level, then damp
            let angle = (other.pos.y - w.pos.y).atan2(other.pos.x - w.pos.x);
            if angle.abs() > 1e-2 {
                if angle > 0.0 {
                    w.omega += ANGULAR_ACCELERATION;
                } else {
                    w.omega -= ANGULAR_DECELERATION;
                }
            }
            w.omega *= 1.0 - ANGULAR_DAMPING;
            if w.omega.abs() < 1e-4 {
                w.omega = 0.0;
            }
        } else if accelerating {
            w.omega = (w.omega + ANGULAR_ACCELERATION).min(MAX_ANGULAR_VELOCITY);
        } else if braking {
            w.omega = (w.omega - ANGULAR_DECELERATION).max(-MAX_ANGULAR_VELOCITY);
        } else {
            w.omega *= 1.0 - ANGULAR_DAMPING;
            if w.omega.abs() < 1e-4 {
                w.omega = 0.0;
            }
        }

        if w.omega.abs() > 1e-6 {
            let mid = (w.pos + other.pos) / 2.0;
            let (sin_a, cos_a) = w.omega.sin_cos();

            let r1 = w.pos - mid;
            let r2 = other.pos - mid;
            w.pos = mid + DVec2::new(r1.x * cos_a + r1.y * sin_a, -r1.x * sin_a + r1.y * cos_a);
            other.pos =
                mid + DVec2::new(r2.x * cos_a + r2.y * sin_a, -r2.x * sin_a + r2.y * cos_a);
        }
    }
}

/// Spring-damper links from wheel `i` to its partners, equal and opposite.
fn apply_links(wheels: &mut [Wheel], i: usize) {
    for k in 0..wheels[i].links.len() {
        let link = wheels[i].links[k];
        let (w, other) = pair_mut(wheels, i, link.partner);

        let delta = other.pos - w.pos;
        let actual = delta.length().max(0.01);
        let displacement = actual - link.rest_distance;
        let spring_force = displacement * SPRING_CONSTANT;

        // the y sign flips between position space (down) and velocity space (up)
        let unit_x = -delta.x / actual;
        let unit_y = delta.y / actual;

        let force_x = unit_x * spring_force;
        let force_y = unit_y * spring_force;

        // damping from the projection of relative velocity onto the link axis
        let rel_v = other.vel - w.vel;
        let v_along = rel_v.x * unit_x + rel_v.y * unit_y;
        let damp_x = v_along * unit_x * DAMPING;
        let damp_y = v_along * unit_y * DAMPING;

        w.vel.x -= force_x - damp_x;
        w.vel.y -= force_y - damp_y;
        other.vel.x += force_x - damp_x;
        other.vel.y += force_y - damp_y;
    }
}
