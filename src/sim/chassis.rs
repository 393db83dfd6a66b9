//! Chassis body: an oriented cluster of points anchored to a center of mass
//!
//! The chassis stores its outline, contact probes, kill-switch probes and
//! decorative attachments as local points, centered and pre-rotated to the
//! body frame; world position of any point is `rotate(p, angle) + center`
//! (the rotation is folded into the stored points incrementally, so world
//! lookup is a plain add). It does not integrate angular velocity: while
//! alive the angle tracks the axle orientation of the first two wheels.

use glam::DVec2;
use log::debug;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::terrain::TerrainStream;
use super::wheel::Wheel;
use crate::consts::*;
use crate::rotate_point;
use crate::tuning::LevelParams;

/// Upper bound on the iterative contact push-out (1 unit per iteration)
const MAX_PUSH_OUT_ITERS: u32 = 64;

/// A decorative point set riding on the chassis (glass, handles, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub points: Vec<DVec2>,
    pub color: [u8; 3],
}

/// Spring-damper constraint from the chassis center to a wheel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelLink {
    pub wheel: usize,
    pub rest_distance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chassis {
    pub center: DVec2,
    pub angle: f64,
    pub vel: DVec2,
    pub alive: bool,
    outline: Vec<DVec2>,
    hitbox: Vec<DVec2>,
    kill_switches: Vec<DVec2>,
    attachments: Vec<Attachment>,
    pub wheel_links: Vec<WheelLink>,
}

impl Chassis {
    /// Assemble a chassis from sprite-local point tables and the already
    /// spawned wheels: centers the point sets on their bounding box, hangs the
    /// body above the wheel centroid along the axle normal, and records the
    /// rest distance to every wheel.
    pub fn build(
        outline: &[DVec2],
        hitbox: &[DVec2],
        kill_switches: &[DVec2],
        attachments: Vec<Attachment>,
        wheels: &[Wheel],
    ) -> Self {
        let mut min = DVec2::splat(f64::MAX);
        let mut max = DVec2::splat(f64::MIN);
        for p in outline {
            min = min.min(*p);
            max = max.max(*p);
        }
        let local_center = (min + max) / 2.0;

        let recenter = |pts: &[DVec2]| pts.iter().map(|p| *p - local_center).collect::<Vec<_>>();
        let mut body = Self {
            center: local_center,
            angle: 0.0,
            vel: DVec2::ZERO,
            alive: true,
            outline: recenter(outline),
            hitbox: recenter(hitbox),
            kill_switches: recenter(kill_switches),
            attachments: attachments
                .into_iter()
                .map(|a| Attachment {
                    points: recenter(&a.points),
                    color: a.color,
                })
                .collect(),
            wheel_links: Vec::new(),
        };

        if wheels.is_empty() {
            return body;
        }

        let mut centroid = DVec2::ZERO;
        let mut avg_radius = 0.0;
        for w in wheels {
            centroid += w.pos;
            avg_radius += w.radius;
        }
        centroid /= wheels.len() as f64;
        avg_radius /= wheels.len() as f64;
        let hang_distance = avg_radius * 3.0;

        let first = &wheels[0];
        let last = &wheels[wheels.len() - 1];
        let theta = (last.pos.y - first.pos.y).atan2(last.pos.x - first.pos.x);

        body.rotate_to(theta);
        body.center = DVec2::new(
            centroid.x + hang_distance * theta.sin(),
            centroid.y - hang_distance * theta.cos(),
        );

        for (i, w) in wheels.iter().enumerate() {
            body.wheel_links.push(WheelLink {
                wheel: i,
                rest_distance: w.pos.distance(body.center),
            });
        }

        body
    }

    /// Rotate every stored local point set to the new absolute angle.
    pub fn rotate_to(&mut self, angle: f64) {
        let delta = angle - self.angle;
        for p in self
            .outline
            .iter_mut()
            .chain(self.hitbox.iter_mut())
            .chain(self.kill_switches.iter_mut())
        {
            *p = rotate_point(*p, delta);
        }
        for a in &mut self.attachments {
            for p in &mut a.points {
                *p = rotate_point(*p, delta);
            }
        }
        self.angle = angle;
    }

    /// End the run: detach every wheel and send it ballistic with a
    /// session-seeded random kick. Idempotent; a dead chassis stays dead and
    /// the wheels are not re-randomized.
    pub fn kill(&mut self, wheels: &mut [Wheel], rng: &mut Pcg32) {
        if !self.alive {
            return;
        }
        self.alive = false;
        debug!("chassis killed at x={:.1}", self.center.x);

        for link in &self.wheel_links {
            let w = &mut wheels[link.wheel];
            w.kill();
            let kick = DVec2::new(
                rng.random::<f64>() * 10.0 - 5.0,
                rng.random::<f64>() * 10.0 - 5.0,
            );
            w.vel += kick;
        }
        self.wheel_links.clear();
    }

    /// Advance the chassis one tick. Returns true when a kill-switch probe
    /// made first contact this tick.
    pub fn step(
        &mut self,
        params: &LevelParams,
        terrain: &TerrainStream,
        wheels: &mut [Wheel],
        rng: &mut Pcg32,
        accelerating: bool,
        braking: bool,
    ) -> bool {
        // chassis orientation follows the axle, not its own inertia
        if self.alive && self.wheel_links.len() >= 2 {
            let a = wheels[self.wheel_links[0].wheel].pos;
            let b = wheels[self.wheel_links[1].wheel].pos;
            let theta = (b.y - a.y).atan2(b.x - a.x);
            self.rotate_to(theta);
        }

        self.center.x += self.vel.x;
        self.center.y -= self.vel.y;

        self.vel.y -= params.gravity;
        self.vel *= 1.0 - params.air_resistance;

        if accelerating && braking {
            self.vel.y -= params.gravity * 0.5;
        }

        let mut killed = false;
        for seg in terrain.segments() {
            for k in 0..self.hitbox.len() {
                self.resolve_probe_contact(seg, self.hitbox[k], params);
            }
            for k in 0..self.kill_switches.len() {
                let probe = self.kill_switches[k];
                if let Some(foot) = self.resolve_probe_contact(seg, probe, params) {
                    if self.alive {
                        self.kill(wheels, rng);
                        killed = true;
                    }
                    // torque-like angular impulse from the probe offset
                    let theta = seg.tangent_angle();
                    let torque = 0.01
                        * ((foot.x - self.center.x) * theta.sin()
                            - (foot.y - self.center.y) * theta.cos());
                    self.angle += 100.0 * torque;
                }
            }
        }

        if self.alive {
            self.apply_suspension(wheels);
        } else {
            self.rest_on_ground(terrain);
        }

        killed
    }

    /// Distance/foot contact test for one probe against one segment; on
    /// contact, nudges the whole chassis out along the segment normal and
    /// resolves the velocity in the tangent frame. Returns the foot of the
    /// perpendicular when contact happened.
    fn resolve_probe_contact(
        &mut self,
        seg: &super::geom::Segment,
        probe: DVec2,
        params: &LevelParams,
    ) -> Option<DVec2> {
        let world = self.center + probe;
        let mut dist = seg.distance_to(world);
        if dist > PROBE_RADIUS || !seg.foot_in_span(world, 1.0) {
            return None;
        }
        let foot_x = seg.foot_x(world);
        let foot = DVec2::new(foot_x, seg.y_at(foot_x));
        let theta = seg.tangent_angle();
        let (sin_t, cos_t) = theta.sin_cos();

        let mut iters = 0;
        while dist < PROBE_RADIUS && iters < MAX_PUSH_OUT_ITERS {
            self.center.y -= cos_t;
            self.center.x -= sin_t;
            dist = seg.distance_to(self.center + probe);
            iters += 1;
        }

        let v_tangent = self.vel.x * cos_t + self.vel.y * sin_t;
        let v_normal = self.vel.y * cos_t - self.vel.x * sin_t;

        // sigmoid-shaped restitution: soft for slow contacts, stiffer for fast
        let v_normal = v_normal * params.restitution / (1.0 + (-v_normal).exp());
        let v_tangent = v_tangent * (1.0 - params.friction);

        self.vel.x = v_tangent * cos_t - v_normal * sin_t;
        self.vel.y = v_tangent * sin_t + v_normal * cos_t;

        Some(foot)
    }

    /// Spring-damper from the center to every linked wheel, equal and opposite.
    fn apply_suspension(&mut self, wheels: &mut [Wheel]) {
        for link in &self.wheel_links {
            let wheel = &mut wheels[link.wheel];

            let delta = wheel.pos - self.center;
            let actual = delta.length();
            if actual == 0.0 {
                continue;
            }
            let displacement = actual - link.rest_distance;
            let spring_force = displacement * SPRING_CONSTANT;

            let unit_x = -delta.x / actual;
            let unit_y = delta.y / actual;

            let force_x = unit_x * spring_force;
            let force_y = unit_y * spring_force;

            let rel_v = wheel.vel - self.vel;
            let v_along = rel_v.x * unit_x + rel_v.y * unit_y;
            let damp_x = v_along * unit_x * DAMPING;
            let damp_y = v_along * unit_y * DAMPING;

            self.vel.x -= force_x - damp_x;
            self.vel.y -= force_y - damp_y;
            wheel.vel.x += force_x - damp_x;
            wheel.vel.y += force_y - damp_y;
        }
    }

    /// Dead-body correction: one upward push so no hitbox probe rests below
    /// ground clearance, preventing the wreck from sinking through terrain.
    fn rest_on_ground(&mut self, terrain: &TerrainStream) {
        let mut push_up: f64 = 0.0;
        for probe in &self.hitbox {
            let world = self.center + *probe;
            for seg in terrain.segments() {
                if world.x < seg.x_min() || world.x > seg.x_max() {
                    continue;
                }
                let ground_y = seg.y_at(world.x);
                let need = world.y - (ground_y - PROBE_CLEARANCE);
                if need > push_up {
                    push_up = need;
                }
                break;
            }
        }
        if push_up > 0.0 {
            self.center.y -= push_up;
        }
    }

    /// World-space outline polygon (for rendering hosts).
    pub fn world_outline(&self) -> Vec<DVec2> {
        self.outline.iter().map(|p| self.center + *p).collect()
    }

    /// World-space decorative attachments with their colors.
    pub fn world_attachments(&self) -> Vec<(Vec<DVec2>, [u8; 3])> {
        self.attachments
            .iter()
            .map(|a| {
                (
                    a.points.iter().map(|p| self.center + *p).collect(),
                    a.color,
                )
            })
            .collect()
    }

    /// World-space kill-switch probes (for game-over arming queries).
    pub fn world_kill_switches(&self) -> Vec<DVec2> {
        self.kill_switches.iter().map(|p| self.center + *p).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geom::Segment;
    use crate::sim::wheel;
    use crate::tuning::stage_params;
    use rand::SeedableRng;

    fn spawn() -> (Chassis, Vec<Wheel>) {
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
        (chassis, wheels)
    }

    #[test]
    fn test_build_links_all_wheels() {
        let (chassis, wheels) = spawn();
        assert_eq!(chassis.wheel_links.len(), wheels.len());
        for link in &chassis.wheel_links {
            assert!(link.rest_distance > 0.0);
        }
        // level spawn: axle is horizontal
        assert!(chassis.angle.abs() < 1e-9);
        // body hangs above the wheels (y-down world)
        assert!(chassis.center.y < wheels[0].pos.y);
    }

    #[test]
    fn test_rotate_to_preserves_point_norms() {
        let (mut chassis, _) = spawn();
        let norms: Vec<f64> = chassis.outline.iter().map(|p| p.length()).collect();
        chassis.rotate_to(1.2);
        chassis.rotate_to(-0.4);
        for (p, n) in chassis.outline.iter().zip(norms) {
            assert!((p.length() - n).abs() < 1e-9);
        }
    }

    #[test]
    fn test_kill_is_idempotent() {
        let (mut chassis, mut wheels) = spawn();
        let mut rng = Pcg32::seed_from_u64(3);

        chassis.kill(&mut wheels, &mut rng);
        assert!(!chassis.alive);
        assert!(wheels.iter().all(|w| !w.alive));
        let vels: Vec<DVec2> = wheels.iter().map(|w| w.vel).collect();

        // second kill must not re-randomize anything
        chassis.kill(&mut wheels, &mut rng);
        assert!(!chassis.alive);
        for (w, v) in wheels.iter().zip(vels) {
            assert_eq!(w.vel, v);
        }
    }

    #[test]
    fn test_kill_probe_contact_kills_once() {
        let (mut chassis, mut wheels) = spawn();
        let mut rng = Pcg32::seed_from_u64(3);
        let params = stage_params(0);
        let terrain = TerrainStream::from_segments_for_test(vec![Segment::new(
            DVec2::new(-10_000.0, 50.0),
            DVec2::new(10_000.0, 50.0),
        )]);

        // roll the car onto its roof: reverse the axle so orientation tracking
        // keeps the flip, then drop a kill probe into contact range
        let rear = wheels[0].pos;
        wheels[0].pos = wheels[1].pos;
        wheels[1].pos = rear;
        chassis.rotate_to(std::f64::consts::PI);
        let probe = chassis.world_kill_switches()[0];
        chassis.center.y += 50.0 - PROBE_RADIUS / 2.0 - probe.y;

        let killed = chassis.step(params, &terrain, &mut wheels, &mut rng, false, false);
        assert!(killed);
        assert!(!chassis.alive);
        assert!(chassis.wheel_links.is_empty());

        // dead body keeps stepping without re-triggering
        let killed_again = chassis.step(params, &terrain, &mut wheels, &mut rng, false, false);
        assert!(!killed_again);
    }

    #[test]
    fn test_dead_body_rests_above_ground() {
        let (mut chassis, mut wheels) = spawn();
        let mut rng = Pcg32::seed_from_u64(9);
        let params = stage_params(0);
        let terrain = TerrainStream::from_segments_for_test(vec![Segment::new(
            DVec2::new(-10_000.0, 50.0),
            DVec2::new(10_000.0, 50.0),
        )]);

        chassis.kill(&mut wheels, &mut rng);
        chassis.vel = DVec2::ZERO;
        // bury the wreck below the surface
        chassis.center.y = 300.0;

        chassis.step(params, &terrain, &mut wheels, &mut rng, false, false);
        for probe in &chassis.hitbox {
            let world = chassis.center + *probe;
            assert!(world.y <= 50.0 - PROBE_CLEARANCE + 1e-9);
        }
    }

    #[test]
    fn test_suspension_is_momentum_conserving() {
        let (mut chassis, mut wheels) = spawn();
        // stretch the body away from the wheels
        chassis.center.y -= 30.0;

        let before = chassis.vel + wheels.iter().map(|w| w.vel).sum::<DVec2>();
        chassis.apply_suspension(&mut wheels);
        let after = chassis.vel + wheels.iter().map(|w| w.vel).sum::<DVec2>();
        assert!((after - before).length() < 1e-12);
    }
}
