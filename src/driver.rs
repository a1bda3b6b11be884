//! Deterministic scripted driver.
//!
//! Follows the centerline with pure-pursuit steering toward a look-ahead
//! point and a curvature-programmed target speed, optionally pulling the
//! handbrake through tight sections. It produces the same `InputState`
//! contract a learned policy would, so it exercises the whole core without
//! any training in the loop. No clock and no RNG: the same state always
//! yields the same input.

use crate::config::SimConfig;
use crate::data::{CarState, InputState};
use crate::geometry::wrap_angle;
use crate::track::Track;

#[derive(Debug, Clone)]
pub struct ScriptedDriver {
    /// Arc-length distance to the pursuit point.
    pub lookahead: f64,
    /// Steering response to the bearing error.
    pub steering_gain: f64,
    /// Fraction of `max_speed` targeted on a straight.
    pub cruise_fraction: f64,
    /// Fraction of `max_speed` targeted through the sharpest curve.
    pub corner_fraction: f64,
    /// How many centerline vertices ahead feed the speed plan.
    pub plan_vertices: usize,
    /// Curvature deviation above which the handbrake comes on.
    pub handbrake_threshold: Option<f64>,
}

impl Default for ScriptedDriver {
    fn default() -> Self {
        Self {
            lookahead: 180.0,
            steering_gain: 2.0,
            cruise_fraction: 0.95,
            corner_fraction: 0.45,
            plan_vertices: 6,
            handbrake_threshold: None,
        }
    }
}

impl ScriptedDriver {
    /// Computes the control input for the current car state.
    pub fn drive(&self, track: &Track, config: &SimConfig, car: &CarState) -> InputState {
        let target = track.point_at(car.track_s + self.lookahead);
        let bearing = wrap_angle((target - car.position).angle() - car.heading);
        let steer = (bearing * self.steering_gain).clamp(-1.0, 1.0);

        // Sharpest upcoming curvature decides how much to slow down.
        let mut worst_deviation: f64 = 0.0;
        for k in 1..=self.plan_vertices {
            let deviation = (track.curvature_unit_at(car.centerline_index + k) - 0.5).abs() * 2.0;
            worst_deviation = worst_deviation.max(deviation);
        }

        let span = self.cruise_fraction - self.corner_fraction;
        let target_speed =
            config.max_speed * (self.cruise_fraction - span * worst_deviation.min(1.0));

        let speed_error = target_speed - car.speed;
        let (throttle, brake) = if speed_error > 5.0 {
            (1.0, 0.0)
        } else if speed_error < -20.0 {
            (0.0, 1.0)
        } else if speed_error < 0.0 {
            (0.0, (-speed_error / 20.0).clamp(0.0, 0.5))
        } else {
            (0.4, 0.0)
        };

        let drift = self
            .handbrake_threshold
            .map(|threshold| worst_deviation > threshold && car.speed > target_speed)
            .unwrap_or(false);

        InputState {
            steer,
            throttle,
            brake,
            drift,
        }
    }
}
