//! Race-flow state machine driven by whichever collaborator owns the tick
//! loop.
//!
//! Signals arrive pre-debounced: a collaborator turns raw key events into
//! one-shot booleans before calling [`RaceController::advance`]. While
//! paused, counting down, or fading through a respawn the world is not
//! stepped at all.

use crate::config::SimConfig;
use crate::data::{InputState, StepInfo, WorldState};
use crate::track::Track;
use crate::world;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacePhase {
    Loading,
    Countdown,
    Racing,
    Paused,
    Respawning,
    Finished,
}

/// One-shot control signals for a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaceSignals {
    pub start_game: bool,
    pub toggle_pause: bool,
    pub restart: bool,
    pub restart_no_countdown: bool,
    pub race_again: bool,
}

/// Drives phase transitions, stuck detection, and respawn placement around
/// the pure world stepper.
#[derive(Debug, Clone)]
pub struct RaceController {
    pub phase: RacePhase,
    pub countdown_ticks_remaining: u32,
    pub respawn_ticks_remaining: u32,
    /// Consecutive ticks below the stuck speed threshold.
    pub stuck_ticks: u32,
    /// Laps required to finish; zero means freeplay.
    pub target_laps: u32,
}

impl RaceController {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            phase: RacePhase::Loading,
            countdown_ticks_remaining: 0,
            respawn_ticks_remaining: 0,
            stuck_ticks: 0,
            target_laps: config.target_laps,
        }
    }

    fn countdown_length(config: &SimConfig) -> u32 {
        config.countdown_beats * config.countdown_ticks_per_beat
    }

    /// Runs one controller tick. Returns the step record when the world was
    /// actually stepped (the `Racing` phase only).
    pub fn advance(
        &mut self,
        track: &Track,
        config: &SimConfig,
        state: &mut WorldState,
        input: &InputState,
        signals: &RaceSignals,
    ) -> Option<StepInfo> {
        self.apply_signals(track, config, state, signals);

        match self.phase {
            RacePhase::Loading | RacePhase::Paused | RacePhase::Finished => None,
            RacePhase::Countdown => {
                if self.countdown_ticks_remaining > 0 {
                    self.countdown_ticks_remaining -= 1;
                }
                if self.countdown_ticks_remaining == 0 {
                    self.phase = RacePhase::Racing;
                }
                None
            }
            RacePhase::Respawning => {
                if self.respawn_ticks_remaining > 0 {
                    self.respawn_ticks_remaining -= 1;
                }
                if self.respawn_ticks_remaining == 0 {
                    place_at_respawn(track, config, state);
                    self.phase = RacePhase::Racing;
                }
                None
            }
            RacePhase::Racing => {
                let (next, mut info) = world::step(track, config, state, input);
                *state = next;

                if state.car.speed.abs() < config.stuck_speed_threshold {
                    self.stuck_ticks += 1;
                } else {
                    self.stuck_ticks = 0;
                }

                let stuck_timeout = self.stuck_ticks >= config.stuck_timeout_ticks;
                if stuck_timeout {
                    info.stuck = true;
                }
                if stuck_timeout || info.health_depleted {
                    self.phase = RacePhase::Respawning;
                    self.respawn_ticks_remaining = config.respawn_fade_ticks;
                    self.stuck_ticks = 0;
                } else if self.target_laps > 0 && state.timing.current_lap > self.target_laps {
                    self.phase = RacePhase::Finished;
                }

                Some(info)
            }
        }
    }

    fn apply_signals(
        &mut self,
        track: &Track,
        config: &SimConfig,
        state: &mut WorldState,
        signals: &RaceSignals,
    ) {
        if signals.restart {
            *state = world::reset_from(track, config, state)
                .expect("configuration was validated at world creation");
            self.phase = RacePhase::Countdown;
            self.countdown_ticks_remaining = Self::countdown_length(config);
            self.stuck_ticks = 0;
            self.respawn_ticks_remaining = 0;
            return;
        }
        if signals.restart_no_countdown {
            *state = world::reset_from(track, config, state)
                .expect("configuration was validated at world creation");
            self.phase = RacePhase::Racing;
            self.stuck_ticks = 0;
            self.respawn_ticks_remaining = 0;
            return;
        }
        match self.phase {
            RacePhase::Loading if signals.start_game => {
                self.phase = RacePhase::Countdown;
                self.countdown_ticks_remaining = Self::countdown_length(config);
            }
            RacePhase::Racing if signals.toggle_pause => {
                self.phase = RacePhase::Paused;
            }
            RacePhase::Paused if signals.toggle_pause => {
                self.phase = RacePhase::Racing;
            }
            RacePhase::Finished if signals.race_again => {
                *state = world::reset_from(track, config, state)
                    .expect("configuration was validated at world creation");
                self.phase = RacePhase::Countdown;
                self.countdown_ticks_remaining = Self::countdown_length(config);
            }
            _ => {}
        }
    }
}

/// Repositions the car at the last crossed gate (or the spawn pose when no
/// gate has been taken), at rest, with lap timing untouched.
fn place_at_respawn(track: &Track, config: &SimConfig, state: &mut WorldState) {
    let (position, heading) = match state.timing.last_gate {
        Some(i) => {
            let gate = &track.checkpoints[i];
            (gate.center, gate.direction.angle())
        }
        None => (track.spawn_position, track.spawn_heading),
    };

    let car = &mut state.car;
    car.position = position;
    car.prev_position = position;
    car.heading = heading;
    car.velocity = crate::geometry::Vec2::default();
    car.speed = 0.0;
    car.yaw_rate = 0.0;
    car.is_drifting = false;
    car.slip_angle = 0.0;
    car.last_steer = 0.0;
    car.health = config.max_health;
    let projection = track.project(position);
    car.track_s = projection.s;
    car.lateral_distance = projection.distance;
    car.centerline_index = projection.segment;
}
