//! Core state records shared across the simulation.
//!
//! Fixed-shape structs rather than loose maps: the per-tick path reads and
//! writes plain fields only.

use crate::config::SimConfig;
use crate::geometry::Vec2;
use crate::track::Track;
use serde::{Deserialize, Serialize};

/// Continuous control input for one tick. Learned policies emit the scalars
/// directly; keyboard collaborators map keys to 0/1 before calling in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    /// Steering in `[-1, 1]`, positive = counter-clockwise.
    pub steer: f64,
    /// Throttle in `[0, 1]`.
    pub throttle: f64,
    /// Brake in `[0, 1]`.
    pub brake: f64,
    /// Handbrake; while held the car is in the drift regime.
    pub drift: bool,
}

impl InputState {
    /// Copy with all scalars clamped to their contract ranges.
    pub fn clamped(self) -> Self {
        Self {
            steer: self.steer.clamp(-1.0, 1.0),
            throttle: self.throttle.clamp(0.0, 1.0),
            brake: self.brake.clamp(0.0, 1.0),
            drift: self.drift,
        }
    }
}

/// Which surface band the car currently occupies, by lateral displacement
/// from the centerline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    Road,
    Runoff,
}

/// Mutable per-tick car state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarState {
    pub position: Vec2,
    /// Position at the start of the tick; gate crossings test the segment
    /// `prev_position → position`.
    pub prev_position: Vec2,
    /// Facing direction in radians (math convention, CCW positive, 0 = +x).
    pub heading: f64,
    /// World-space velocity, independent of `heading`; the angle between
    /// the two is the slip.
    pub velocity: Vec2,
    /// Signed scalar speed along the heading direction; negative in reverse.
    pub speed: f64,
    /// Angular velocity in rad/s.
    pub yaw_rate: f64,
    /// True while the handbrake input is held.
    pub is_drifting: bool,
    pub health: f64,
    pub surface: Surface,
    /// `|atan2(v_lat, v_long)|` relative to heading.
    pub slip_angle: f64,
    /// Arc-length position of the centerline projection, cached per tick.
    pub track_s: f64,
    /// Unsigned lateral distance to the centerline, cached per tick.
    pub lateral_distance: f64,
    /// Nearest centerline vertex index, cached per tick for lookahead.
    pub centerline_index: usize,
    /// Steering input from the previous tick, for smoothness shaping.
    pub last_steer: f64,
}

impl CarState {
    /// Car at the track's spawn pose, at rest and at full health.
    pub fn at_spawn(track: &Track, config: &SimConfig) -> Self {
        let projection = track.project(track.spawn_position);
        Self {
            position: track.spawn_position,
            prev_position: track.spawn_position,
            heading: track.spawn_heading,
            velocity: Vec2::default(),
            speed: 0.0,
            yaw_rate: 0.0,
            is_drifting: false,
            health: config.max_health,
            surface: Surface::Road,
            slip_angle: 0.0,
            track_s: projection.s,
            lateral_distance: projection.distance,
            centerline_index: projection.segment,
            last_steer: 0.0,
        }
    }

    pub fn heading_unit(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }
}

/// Lap and checkpoint accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// 1-based lap counter.
    pub current_lap: u32,
    pub current_lap_ticks: u32,
    /// Best completed lap in ticks; zero means unset.
    pub best_lap_ticks: u32,
    pub total_race_ticks: u64,
    /// Index of the breadcrumb the car must collect next.
    pub next_breadcrumb: usize,
    /// Bitmask of intermediate gates crossed this lap (bit = gate index).
    pub crossed_gates: u64,
    /// Last gate the car passed through; respawn anchor.
    pub last_gate: Option<usize>,
    /// One-shot edge signal, true only on the tick a lap completes.
    pub lap_completed: bool,
}

impl Timing {
    pub fn new() -> Self {
        Self {
            current_lap: 1,
            current_lap_ticks: 0,
            best_lap_ticks: 0,
            total_race_ticks: 0,
            next_breadcrumb: 0,
            crossed_gates: 0,
            last_gate: None,
            lap_completed: false,
        }
    }

    pub fn gate_crossed(&self, index: usize) -> bool {
        self.crossed_gates & (1u64 << index) != 0
    }

    pub fn mark_gate(&mut self, index: usize) {
        self.crossed_gates |= 1u64 << index;
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete simulation state. A value: `step` produces a new one, and
/// independent rollouts clone and diverge freely while sharing one `Track`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub car: CarState,
    pub timing: Timing,
    /// Ticks since the last reset.
    pub tick: u64,
}

/// What happened during one tick, for reward assembly and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepInfo {
    /// Breadcrumbs genuinely collected this tick (auto-advances excluded).
    pub breadcrumbs_collected: u32,
    pub lap_completed: bool,
    /// Signed centerline arc-length advance since last tick, wrap-safe.
    pub progress_delta: f64,
    pub lateral_distance: f64,
    /// Wall impact speed this tick, zero when clear.
    pub impact_speed: f64,
    /// Health lost to walls this tick.
    pub impact_damage: f64,
    /// `|speed| / max_speed` after the tick.
    pub speed_fraction: f64,
    /// First-lookahead curvature deviation, `|c - 0.5| * 2` in `[0, 1]`.
    pub curvature_deviation: f64,
    /// `|steer - last_steer|` for smoothness shaping.
    pub steer_delta: f64,
    /// Health reached zero this tick.
    pub health_depleted: bool,
    /// Set by the race controller when a stuck timeout fires.
    pub stuck: bool,
}
