//! End-to-end scenarios driven through the public API: sprints, drifts,
//! wall hits, lap accounting, and respawn flow on real circuits.

use driftsim::driver::ScriptedDriver;
use driftsim::geometry::wrap_angle;
use driftsim::{
    track, world, InputState, RaceController, RacePhase, RaceSignals, SimConfig, Vec2, WorldState,
};

fn idle() -> InputState {
    InputState::default()
}

fn full_throttle() -> InputState {
    InputState {
        throttle: 1.0,
        ..InputState::default()
    }
}

/// Steps the world once so the car's motion segment crosses the given gate
/// at speed.
fn drive_through_gate(
    track: &track::Track,
    config: &SimConfig,
    state: &mut WorldState,
    gate: usize,
) {
    let g = &track.checkpoints[gate];
    let car = &mut state.car;
    car.position = g.center - g.direction * 0.5;
    car.heading = g.direction.angle();
    car.speed = 100.0;
    car.velocity = g.direction * 100.0;
    let proj = track.project(car.position);
    car.track_s = proj.s;
    car.centerline_index = proj.segment;
    *state = world::step(track, config, state, &full_throttle()).0;
}

#[test]
fn test_straight_sprint() {
    let config = SimConfig::default();
    let track = track::demo_circuit(&config).unwrap();
    let mut state = world::reset(&track, &config).unwrap();

    let mut breadcrumbs = 0u32;
    for tick in 0..600u32 {
        let (next, info) = world::step(&track, &config, &state, &full_throttle());
        breadcrumbs += info.breadcrumbs_collected;
        state = next;
        if tick == 77 {
            assert!(
                (state.car.speed - config.max_speed).abs() <= config.max_speed * 0.01,
                "speed {} should have saturated by tick 78",
                state.car.speed
            );
        }
    }

    assert!(breadcrumbs >= 1, "a flat-out straight collects breadcrumbs");
    assert_eq!(state.timing.total_race_ticks, 600);
    assert_eq!(state.tick, 600);
}

#[test]
fn test_drift_slides_wide() {
    // Extra-wide circuit so the slide has room to develop away from walls.
    let mut config = SimConfig::default();
    config.track_half_width = 400.0;
    let track = track::demo_circuit(&config).unwrap();
    let mut state = world::reset(&track, &config).unwrap();

    for _ in 0..60 {
        state = world::step(&track, &config, &state, &full_throttle()).0;
    }
    let heading_at_speed = state.car.heading;
    let velocity_angle_at_speed = state.car.velocity.angle();

    let mut drift_state = state.clone();
    let drift_input = InputState {
        throttle: 1.0,
        steer: 1.0,
        drift: true,
        ..InputState::default()
    };
    for _ in 0..45 {
        drift_state = world::step(&track, &config, &drift_state, &drift_input).0;
    }

    assert!(drift_state.car.is_drifting);
    assert!(drift_state.car.yaw_rate > 0.0, "left steer spins CCW");
    assert!(
        drift_state.car.slip_angle > 0.15,
        "slip angle {} should show a real slide",
        drift_state.car.slip_angle
    );
    // The car points further round the turn than it travels: the velocity
    // direction lags the nose by the slip angle.
    let heading_swing = wrap_angle(drift_state.car.heading - heading_at_speed).abs();
    let course_swing =
        wrap_angle(drift_state.car.velocity.angle() - velocity_angle_at_speed).abs();
    assert!(
        course_swing < heading_swing,
        "course moved {course_swing}, nose moved {heading_swing}"
    );
}

#[test]
fn test_wall_bounce_damages_and_reflects() {
    let config = SimConfig::default();
    let track = track::demo_circuit(&config).unwrap();
    let mut state = world::reset(&track, &config).unwrap();

    // Aim straight at the outer wall of the bottom straight, close enough
    // to hit within one tick.
    let car = &mut state.car;
    car.position = Vec2::new(500.0, -config.track_half_width + 12.0);
    car.heading = -std::f64::consts::FRAC_PI_2;
    car.speed = 200.0;
    car.velocity = car.heading_unit() * 200.0;

    let health_before = state.car.health;
    let (next, info) = world::step(&track, &config, &state, &idle());

    assert!(info.impact_speed > 190.0, "impact speed {}", info.impact_speed);
    let expected_damage =
        (info.impact_speed - config.min_damage_speed) * config.wall_damage_multiplier;
    assert!((info.impact_damage - expected_damage).abs() < 1e-9);
    assert!((health_before - next.car.health - expected_damage).abs() < 1e-9);
    // Normal velocity flipped away from the wall and scaled by the bounce.
    assert!(next.car.velocity.y > 0.0);
    assert!((next.car.velocity.y - info.impact_speed * config.bounce).abs() < 1e-6);
}

#[test]
fn test_clean_lap_credits_and_sets_best() {
    let config = SimConfig::default();
    let track = track::demo_circuit(&config).unwrap();
    let mut state = world::reset(&track, &config).unwrap();

    // Sit through the grace window first.
    for _ in 0..config.grace_ticks {
        state = world::step(&track, &config, &state, &idle()).0;
    }
    assert_eq!(state.timing.current_lap, 1);

    // Cross every intermediate gate in track order, then the finish.
    let finish = track.finish_gate_index();
    let intermediates: Vec<usize> = (0..track.checkpoints.len())
        .filter(|&i| i != finish)
        .collect();
    for &gate in &intermediates {
        drive_through_gate(&track, &config, &mut state, gate);
        assert_eq!(state.timing.current_lap, 1, "no credit before the finish");
    }
    drive_through_gate(&track, &config, &mut state, finish);

    assert_eq!(state.timing.current_lap, 2);
    assert!(state.timing.best_lap_ticks > 0, "best lap recorded");
    assert_eq!(
        state.timing.current_lap_ticks, 1,
        "lap counter restarted on the completion tick"
    );
    assert_eq!(state.timing.crossed_gates, 0);
}

#[test]
fn test_finish_shortcut_is_refused() {
    let config = SimConfig::default();
    let track = track::demo_circuit(&config).unwrap();
    let mut state = world::reset(&track, &config).unwrap();

    for _ in 0..config.grace_ticks {
        state = world::step(&track, &config, &state, &idle()).0;
    }

    let finish = track.finish_gate_index();
    drive_through_gate(&track, &config, &mut state, finish);
    drive_through_gate(&track, &config, &mut state, finish);

    assert_eq!(state.timing.current_lap, 1, "no lap without the intermediates");
    assert_eq!(state.timing.best_lap_ticks, 0, "best lap stays unset");
}

#[test]
fn test_stuck_car_respawns_with_timing_preserved() {
    let mut config = SimConfig::default();
    config.countdown_beats = 1;
    config.countdown_ticks_per_beat = 5;
    config.stuck_timeout_ticks = 40;
    config.respawn_fade_ticks = 12;
    let track = track::demo_circuit(&config).unwrap();
    let mut state = world::reset(&track, &config).unwrap();
    let mut controller = RaceController::new(&config);

    let mut signals = RaceSignals {
        start_game: true,
        ..RaceSignals::default()
    };
    let total = config.countdown_beats * config.countdown_ticks_per_beat
        + config.stuck_timeout_ticks
        + config.respawn_fade_ticks;
    for _ in 0..total {
        controller.advance(&track, &config, &mut state, &idle(), &signals);
        signals = RaceSignals::default();
    }

    assert_eq!(controller.phase, RacePhase::Racing);
    // No gate was ever crossed, so the anchor is the spawn pose.
    assert_eq!(state.car.position, track.spawn_position);
    assert!((state.car.heading - track.spawn_heading).abs() < 1e-12);
    assert_eq!(state.car.velocity, Vec2::default());
    assert_eq!(state.car.yaw_rate, 0.0);
    assert_eq!(
        state.timing.total_race_ticks,
        config.stuck_timeout_ticks as u64,
        "only racing ticks count, and they survive the respawn"
    );
}

#[test]
fn test_scripted_driver_laps_the_oval() {
    let mut config = SimConfig::default();
    config.target_laps = 1;
    let track = track::demo_circuit(&config).unwrap();
    let mut state = world::reset(&track, &config).unwrap();
    let driver = ScriptedDriver::default();

    let mut laps_seen = 0u32;
    for _ in 0..20_000u32 {
        let input = driver.drive(&track, &config, &state.car);
        let (next, info) = world::step(&track, &config, &state, &input);
        state = next;
        if info.lap_completed {
            laps_seen += 1;
            break;
        }
    }

    assert_eq!(laps_seen, 1, "the scripted driver finishes a lap");
    assert_eq!(state.timing.current_lap, 2);
    assert!(state.timing.best_lap_ticks > 0);
    assert!(
        state.car.health > 0.0,
        "lapping the oval should not total the car"
    );
}
