//! The fixed-timestep world stepper.
//!
//! `step` is a pure function of `(track, config, state, input)`: no clock,
//! no randomness, no hidden state. Two calls with the same arguments give
//! bit-identical results, which is what lets parallel rollouts share a
//! track and replay trajectories exactly.
//!
//! The per-tick order is part of the contract: previous-position capture,
//! dynamics, wall collision, centerline projection and surface
//! classification, lap/checkpoint accounting, counters. Collision runs
//! before lap accounting, so a gate crossed during a wall scrape is judged
//! on the post-collision motion segment.

use crate::config::{ConfigError, SimConfig};
use crate::data::{CarState, InputState, StepInfo, Surface, Timing, WorldState};
use crate::physics;
use crate::progress;
use crate::track::Track;

/// Creates a fresh world at the track's spawn pose.
///
/// Everything that could make the hot path fail is rejected here, so `step`
/// itself is total.
pub fn reset(track: &Track, config: &SimConfig) -> Result<WorldState, ConfigError> {
    config.validate()?;
    Ok(WorldState {
        car: CarState::at_spawn(track, config),
        timing: Timing::new(),
        tick: 0,
    })
}

/// Like [`reset`], but carries the session best lap forward from a previous
/// state when `preserve_best_lap_on_reset` is set.
pub fn reset_from(
    track: &Track,
    config: &SimConfig,
    previous: &WorldState,
) -> Result<WorldState, ConfigError> {
    let mut state = reset(track, config)?;
    if config.preserve_best_lap_on_reset {
        state.timing.best_lap_ticks = previous.timing.best_lap_ticks;
    }
    Ok(state)
}

/// Advances the world one tick, returning the new state and a record of
/// what happened for reward assembly.
pub fn step(
    track: &Track,
    config: &SimConfig,
    state: &WorldState,
    input: &InputState,
) -> (WorldState, StepInfo) {
    let dt = config.dt();
    let mut next = state.clone();
    let prev_s = next.car.track_s;
    let prev_steer = next.car.last_steer;
    let health_before = next.car.health;

    // 1. The motion segment for gate tests starts here.
    next.car.prev_position = next.car.position;

    // 2. Dynamics.
    physics::update_car(&mut next.car, config, input, dt);

    // 3. Walls.
    let collision = physics::resolve_wall_collisions(&mut next.car, track, config);

    // 4. Centerline projection and surface classification.
    let projection = track.project(next.car.position);
    next.car.track_s = projection.s;
    next.car.lateral_distance = projection.distance;
    next.car.centerline_index = projection.segment;
    next.car.surface = if projection.distance <= track.half_width {
        Surface::Road
    } else {
        Surface::Runoff
    };

    // 5. Laps, gates, breadcrumbs. Uses the tick index of this step.
    let outcome =
        progress::update_lap_progress(&next.car, &mut next.timing, track, config, next.tick);

    // 6. Counters.
    next.timing.total_race_ticks += 1;
    next.timing.current_lap_ticks += 1;
    next.tick += 1;

    let speed_fraction = if config.max_speed > 0.0 {
        (next.car.speed.abs() / config.max_speed).min(1.0)
    } else {
        0.0
    };
    let curvature_deviation =
        (track.curvature_unit_at(next.car.centerline_index + 1) - 0.5).abs() * 2.0;

    let info = StepInfo {
        breadcrumbs_collected: outcome.breadcrumbs_collected,
        lap_completed: outcome.lap_completed,
        progress_delta: track.arc_delta(prev_s, next.car.track_s),
        lateral_distance: next.car.lateral_distance,
        impact_speed: collision.impact_speed,
        impact_damage: collision.damage,
        speed_fraction,
        curvature_deviation,
        steer_delta: (input.clamped().steer - prev_steer).abs(),
        health_depleted: health_before > 0.0 && next.car.health <= 0.0,
        stuck: false,
    };

    (next, info)
}
