//! Simulation configuration.
//!
//! A single flat record covering dynamics, damage, track geometry,
//! observation shape, race-control timing, and reward weights. Every option
//! is tunable from a TOML file without code changes; missing keys fall back
//! to the defaults below. Validation happens once, before a world is
//! created, so the per-tick path never has to re-check.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Weights for the per-tick reward components. A weight of zero disables its
/// component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    /// Bonus per breadcrumb genuinely collected (auto-advances pay nothing).
    pub breadcrumb: f64,
    /// Bonus on lap completion.
    pub lap: f64,
    /// Scale on signed centerline arc-length advance per tick.
    pub progress: f64,
    /// Extra penalty scale on backward arc-length motion.
    pub backward: f64,
    /// Penalty scale on lateral distance to the centerline.
    pub lateral: f64,
    /// Penalty scale on wall impact damage.
    pub wall: f64,
    /// Penalty scale on `speed_fraction * curvature_deviation` ahead.
    pub corner: f64,
    /// Flat penalty per tick.
    pub time: f64,
    /// Bonus when the steering change stays below `smooth_steer_threshold`.
    pub smooth: f64,
    /// Steering-delta threshold for the smoothness bonus.
    pub smooth_steer_threshold: f64,
    /// Penalty on health exhaustion or stuck termination.
    pub death: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            breadcrumb: 1.0,
            lap: 50.0,
            progress: 0.05,
            backward: 0.1,
            lateral: 0.002,
            wall: 0.5,
            corner: 0.3,
            time: 0.01,
            smooth: 0.05,
            smooth_steer_threshold: 0.1,
            death: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Simulation tick frequency in Hz.
    pub tick_rate_hz: u32,

    // Longitudinal dynamics
    pub max_speed: f64,
    /// Speed floor while reversing; zero or negative.
    pub reverse_max_speed: f64,
    pub acceleration: f64,
    pub brake_force: f64,
    /// Fraction of speed retained per second when coasting.
    pub friction_decay: f64,

    // Rotational dynamics
    /// Peak steering rate in rad/s at full speed fraction.
    pub steering_rate: f64,
    /// Fraction of yaw rate retained per second.
    pub yaw_damping: f64,

    // Grip regime
    /// Velocity-blend coefficient while the handbrake is held.
    pub drift_grip: f64,
    /// Velocity-blend coefficient under normal grip.
    pub normal_grip: f64,
    /// Per-tick yaw-rate gain while drifting.
    pub drift_yaw_gain: f64,

    // Damage model
    pub max_health: f64,
    pub wall_damage_multiplier: f64,
    /// Impact speeds at or below this cause no damage.
    pub min_damage_speed: f64,
    /// Fraction of the normal velocity reflected off a wall.
    pub bounce: f64,

    // Collision rectangle
    pub car_length: f64,
    pub car_width: f64,

    // Track geometry and breadcrumb chain
    pub track_half_width: f64,
    pub breadcrumb_spacing: f64,
    /// Spacing contraction inside tight sections.
    pub zigzag_multiplier: f64,
    /// Successive-segment angle (radians) above which a section is tight.
    pub tight_angle_threshold: f64,
    pub spawn_forward_offset: f64,
    pub breadcrumb_radius: f64,
    /// How many spacings the car may run ahead of the target breadcrumb
    /// before the chain advances without reward.
    pub breadcrumb_auto_advance_multiplier: f64,

    // Observation shape
    /// Car-relative ray angles in radians, forward-weighted.
    pub ray_angles: Vec<f64>,
    pub max_ray_distance: f64,
    /// Number of curvature lookahead samples.
    pub lookahead_count: usize,
    /// Yaw-rate normalisation bound for observations.
    pub max_yaw_rate: f64,

    // Race control timing
    pub stuck_speed_threshold: f64,
    pub stuck_timeout_ticks: u32,
    pub respawn_fade_ticks: u32,
    pub countdown_beats: u32,
    pub countdown_ticks_per_beat: u32,
    /// Ticks after reset during which gate crossings do not count.
    pub grace_ticks: u64,
    /// Minimum forward speed for a gate or breadcrumb crossing to count.
    pub min_checkpoint_speed: f64,

    // Race mode
    /// Laps to finish the race; zero means freeplay.
    pub target_laps: u32,
    /// Whether `reset` carries the session best lap forward.
    pub preserve_best_lap_on_reset: bool,

    pub reward: RewardWeights,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,

            max_speed: 300.0,
            reverse_max_speed: -80.0,
            acceleration: 250.0,
            brake_force: 350.0,
            friction_decay: 0.4,

            steering_rate: 3.5,
            yaw_damping: 0.1,

            drift_grip: 0.25,
            normal_grip: 1.0,
            drift_yaw_gain: 1.08,

            max_health: 100.0,
            wall_damage_multiplier: 0.2,
            min_damage_speed: 50.0,
            bounce: 0.4,

            car_length: 36.0,
            car_width: 18.0,

            track_half_width: 60.0,
            breadcrumb_spacing: 50.0,
            zigzag_multiplier: 0.5,
            tight_angle_threshold: 0.6,
            spawn_forward_offset: 40.0,
            breadcrumb_radius: 45.0,
            breadcrumb_auto_advance_multiplier: 2.5,

            ray_angles: vec![
                -90f64.to_radians(),
                -50f64.to_radians(),
                -25f64.to_radians(),
                -10f64.to_radians(),
                0.0,
                10f64.to_radians(),
                25f64.to_radians(),
                50f64.to_radians(),
                90f64.to_radians(),
            ],
            max_ray_distance: 400.0,
            lookahead_count: 5,
            max_yaw_rate: 4.0,

            stuck_speed_threshold: 8.0,
            stuck_timeout_ticks: 180,
            respawn_fade_ticks: 45,
            countdown_beats: 3,
            countdown_ticks_per_beat: 60,
            grace_ticks: 30,
            min_checkpoint_speed: 5.0,

            target_laps: 0,
            preserve_best_lap_on_reset: true,

            reward: RewardWeights::default(),
        }
    }
}

impl SimConfig {
    /// Fixed timestep in seconds.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_rate_hz as f64
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: SimConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(
                "failed to load config from {:?}: {}, using defaults",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Rejects configurations the simulation cannot run with. Called at
    /// load and again at world reset, so `step` itself never has to fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn ensure(ok: bool, msg: &str) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::Invalid(msg.to_string()))
            }
        }

        ensure(self.tick_rate_hz > 0, "tick_rate_hz must be positive")?;
        ensure(self.max_speed >= 0.0, "max_speed must be non-negative")?;
        ensure(
            self.reverse_max_speed <= 0.0,
            "reverse_max_speed must be zero or negative",
        )?;
        ensure(self.acceleration >= 0.0, "acceleration must be non-negative")?;
        ensure(self.brake_force >= 0.0, "brake_force must be non-negative")?;
        ensure(
            self.friction_decay > 0.0 && self.friction_decay <= 1.0,
            "friction_decay must be in (0, 1]",
        )?;
        ensure(
            self.yaw_damping > 0.0 && self.yaw_damping <= 1.0,
            "yaw_damping must be in (0, 1]",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.drift_grip),
            "drift_grip must be in [0, 1]",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.normal_grip),
            "normal_grip must be in [0, 1]",
        )?;
        ensure(self.drift_yaw_gain >= 1.0, "drift_yaw_gain must be >= 1")?;
        ensure(self.max_health > 0.0, "max_health must be positive")?;
        ensure(
            self.wall_damage_multiplier >= 0.0,
            "wall_damage_multiplier must be non-negative",
        )?;
        ensure(
            (0.0..=1.0).contains(&self.bounce),
            "bounce must be in [0, 1]",
        )?;
        ensure(
            self.car_length > 0.0 && self.car_width > 0.0,
            "car dimensions must be positive",
        )?;
        ensure(
            self.track_half_width > 0.0,
            "track_half_width must be positive",
        )?;
        ensure(
            self.breadcrumb_spacing > 0.0,
            "breadcrumb_spacing must be positive",
        )?;
        ensure(
            self.zigzag_multiplier > 0.0 && self.zigzag_multiplier <= 1.0,
            "zigzag_multiplier must be in (0, 1]",
        )?;
        ensure(
            self.breadcrumb_radius > 0.0,
            "breadcrumb_radius must be positive",
        )?;
        ensure(
            self.breadcrumb_auto_advance_multiplier >= 1.0,
            "breadcrumb_auto_advance_multiplier must be >= 1",
        )?;
        ensure(!self.ray_angles.is_empty(), "ray_angles must not be empty")?;
        ensure(
            self.max_ray_distance > 0.0,
            "max_ray_distance must be positive",
        )?;
        ensure(self.max_yaw_rate > 0.0, "max_yaw_rate must be positive")?;
        ensure(
            self.min_checkpoint_speed >= 0.0,
            "min_checkpoint_speed must be non-negative",
        )?;
        ensure(
            self.reward.smooth_steer_threshold >= 0.0,
            "smooth_steer_threshold must be non-negative",
        )?;
        Ok(())
    }
}
