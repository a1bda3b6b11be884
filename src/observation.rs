//! Fixed-length normalised observation vector for learned policies.
//!
//! Layout, in order: one distance per configured ray angle, then scalar
//! speed, yaw rate, drift flag, health, bearing to the next breadcrumb, and
//! finally `lookahead_count` curvature samples along the upcoming
//! centerline. Every component lands in `[0, 1]`.

use crate::config::SimConfig;
use crate::data::{CarState, Timing};
use crate::geometry::{wrap_angle, Vec2};
use crate::track::Track;
use std::f64::consts::PI;

/// Number of scalar components between the rays and the curvature samples.
const SCALAR_COMPONENTS: usize = 5;

/// Total observation length for a given configuration.
pub fn observation_len(config: &SimConfig) -> usize {
    config.ray_angles.len() + SCALAR_COMPONENTS + config.lookahead_count
}

/// Distance from `origin` along `angle` to the first wall, capped at
/// `max_distance`.
///
/// One tight pass over the track's precomputed wall segments: the
/// parametric intersection is evaluated inline with a running minimum, no
/// per-segment allocation and no trig inside the loop. This runs once per
/// ray per tick for every training rollout, so it has to stay cheap.
pub fn cast_ray(track: &Track, origin: Vec2, angle: f64, max_distance: f64) -> f64 {
    let dir = Vec2::from_angle(angle);
    let mut nearest = max_distance;
    for wall in &track.wall_segments {
        let edge = wall.delta();
        let denom = dir.cross(edge);
        if denom.abs() < 1e-12 {
            continue;
        }
        let offset = wall.a - origin;
        let t = offset.cross(edge) / denom;
        if t < 0.0 || t >= nearest {
            continue;
        }
        let u = offset.cross(dir) / denom;
        if (0.0..=1.0).contains(&u) {
            nearest = t;
        }
    }
    nearest
}

/// Fills `out` with the observation for the current state. The buffer is
/// cleared first; reusing one per world avoids reallocation.
pub fn fill_observation(
    track: &Track,
    config: &SimConfig,
    car: &CarState,
    timing: &Timing,
    out: &mut Vec<f64>,
) {
    out.clear();
    out.reserve(observation_len(config));

    for &ray_angle in &config.ray_angles {
        let distance = cast_ray(
            track,
            car.position,
            car.heading + ray_angle,
            config.max_ray_distance,
        );
        out.push((distance / config.max_ray_distance).clamp(0.0, 1.0));
    }

    let speed_norm = if config.max_speed > 0.0 {
        (car.speed / config.max_speed).clamp(0.0, 1.0)
    } else {
        0.0
    };
    out.push(speed_norm);

    // Centred at 0.5 so the sign of the rotation survives normalisation.
    out.push(((car.yaw_rate + config.max_yaw_rate) / (2.0 * config.max_yaw_rate)).clamp(0.0, 1.0));

    out.push(if car.is_drifting { 1.0 } else { 0.0 });

    out.push((car.health / config.max_health).clamp(0.0, 1.0));

    let bearing = if track.breadcrumbs.is_empty() {
        0.0
    } else {
        let target = track.breadcrumbs[timing.next_breadcrumb % track.breadcrumbs.len()];
        wrap_angle((target.position - car.position).angle() - car.heading)
    };
    out.push(((bearing + PI) / (2.0 * PI)).clamp(0.0, 1.0));

    for k in 1..=config.lookahead_count {
        out.push(track.curvature_unit_at(car.centerline_index + k));
    }
}

/// Convenience wrapper allocating a fresh vector.
pub fn build_observation(
    track: &Track,
    config: &SimConfig,
    car: &CarState,
    timing: &Timing,
) -> Vec<f64> {
    let mut out = Vec::new();
    fill_observation(track, config, car, timing, &mut out);
    out
}
