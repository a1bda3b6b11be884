//! Per-tick vehicle dynamics and wall collision response.
//!
//! The dynamics model is a bicycle-style integrator with a grip-blended
//! velocity: the car's facing and its velocity are separate quantities, and
//! each tick the velocity is pulled toward the facing direction by the
//! current grip coefficient. Full grip snaps the velocity onto the heading;
//! handbrake grip leaves most of the previous velocity in place, which is
//! what makes the car slide.
//!
//! All decay factors are per-second fractions raised to `dt`, so behaviour
//! is invariant to the tick rate.

use crate::config::SimConfig;
use crate::data::{CarState, InputState};
use crate::geometry::{self, rectangle_corners, segment_intersection, Vec2};
use crate::track::Track;

/// Speeds below this snap to zero while coasting.
const SPEED_EPSILON: f64 = 0.05;

/// Extra push-out past the computed penetration, to keep the resolved car
/// clear of the wall on the next tick.
const CONTACT_SLACK: f64 = 0.01;

/// Advances the car one tick under `input`.
pub fn update_car(car: &mut CarState, config: &SimConfig, input: &InputState, dt: f64) {
    let input = input.clamped();

    // 1. Steering, scaled by the signed speed fraction: a stationary car
    //    barely turns, and steering inverts naturally in reverse.
    let speed_fraction = if config.max_speed > 0.0 {
        car.speed / config.max_speed
    } else {
        0.0
    };
    car.yaw_rate += input.steer * config.steering_rate * dt * speed_fraction;

    // 2. Grip regime. The handbrake drops grip and feeds the yaw rate.
    car.is_drifting = input.drift;
    let grip = if input.drift {
        car.yaw_rate *= config.drift_yaw_gain;
        config.drift_grip
    } else {
        config.normal_grip
    };

    // 3. Heading integration, kept in the principal range.
    car.heading = geometry::wrap_angle(car.heading + car.yaw_rate * dt);

    // 4-5. Blend the velocity toward the heading-aligned intent.
    let intended = car.heading_unit() * car.speed;
    car.velocity = car.velocity * (1.0 - grip) + intended * grip;

    // 6. Longitudinal input.
    car.speed +=
        input.throttle * config.acceleration * dt - input.brake * config.brake_force * dt;
    car.speed = car.speed.clamp(config.reverse_max_speed, config.max_speed);

    // 7. Coasting friction.
    if input.throttle <= 0.0 && input.brake <= 0.0 {
        car.speed *= config.friction_decay.powf(dt);
        if car.speed.abs() < SPEED_EPSILON {
            car.speed = 0.0;
        }
    }

    // 8. Yaw damping.
    car.yaw_rate *= config.yaw_damping.powf(dt);

    // 9. Position integration.
    car.position += car.velocity * dt;
    car.speed = car.speed.clamp(config.reverse_max_speed, config.max_speed);

    // Slip angle: how far the velocity points away from the nose.
    let heading_unit = car.heading_unit();
    let v_long = car.velocity.dot(heading_unit);
    let v_lat = car.velocity.dot(heading_unit.perp());
    car.slip_angle = v_lat.atan2(v_long).abs();

    car.last_steer = input.steer;
}

/// Result of wall collision resolution for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionOutcome {
    pub hit: bool,
    /// Speed component into the wall at impact.
    pub impact_speed: f64,
    /// Health removed this tick.
    pub damage: f64,
}

/// Tests the car rectangle against every wall segment and resolves the
/// deepest contact.
///
/// Only the maximum-penetration contact is resolved, once per tick; a car
/// straddling two wall segments gets a single push-out rather than a double
/// one. For two walls meeting at an acute angle this slightly under-resolves
/// the shallower wall and the next tick picks it up.
pub fn resolve_wall_collisions(
    car: &mut CarState,
    track: &Track,
    config: &SimConfig,
) -> CollisionOutcome {
    let corners = rectangle_corners(
        car.position,
        car.heading,
        config.car_length,
        config.car_width,
    );

    let mut deepest: Option<(Vec2, f64)> = None;
    for wall in &track.wall_segments {
        for i in 0..4 {
            let edge_a = corners[i];
            let edge_b = corners[(i + 1) % 4];
            let Some(hit) = segment_intersection(edge_a, edge_b, wall.a, wall.b) else {
                continue;
            };
            // Wall normal, disambiguated to point from the wall into the car.
            let mut normal = wall.delta().perp().normalize_or_zero();
            if normal == Vec2::default() {
                continue;
            }
            if normal.dot(car.position - hit) < 0.0 {
                normal = -normal;
            }
            // Deepest corner behind the contact plane.
            let penetration = corners
                .iter()
                .map(|c| (hit - *c).dot(normal))
                .fold(0.0, f64::max);
            if deepest.map_or(true, |(_, p)| penetration > p) {
                deepest = Some((normal, penetration));
            }
        }
    }

    let Some((normal, penetration)) = deepest else {
        return CollisionOutcome::default();
    };

    car.position += normal * (penetration + CONTACT_SLACK);

    let into_wall = car.velocity.dot(normal);
    let mut impact_speed = 0.0;
    if into_wall < 0.0 {
        impact_speed = -into_wall;
        let v_n = normal * into_wall;
        let v_t = car.velocity - v_n;
        car.velocity = v_t - v_n * config.bounce;
        car.speed = car
            .velocity
            .dot(car.heading_unit())
            .clamp(config.reverse_max_speed, config.max_speed);
    }

    let damage = (impact_speed - config.min_damage_speed).max(0.0) * config.wall_damage_multiplier;
    car.health = (car.health - damage).max(0.0);

    CollisionOutcome {
        hit: true,
        impact_speed,
        damage,
    }
}
