//! Reward assembly for learned policies.
//!
//! A pure mapping from what happened in one tick (`StepInfo`) and the
//! configured weights to a scalar plus a per-component breakdown, so
//! training code can log each shaping term separately.

use crate::config::RewardWeights;
use crate::data::StepInfo;

/// Per-component reward contributions for one tick. Signed: penalties are
/// negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardBreakdown {
    pub breadcrumb: f64,
    pub lap: f64,
    pub progress: f64,
    pub backward: f64,
    pub lateral: f64,
    pub wall: f64,
    pub corner: f64,
    pub time: f64,
    pub smooth: f64,
    pub death: f64,
    pub total: f64,
}

/// Assembles the tick reward. Every component is gated by its weight; a
/// zero weight disables the term entirely.
pub fn compute_reward(info: &StepInfo, weights: &RewardWeights) -> RewardBreakdown {
    let mut r = RewardBreakdown::default();

    r.breadcrumb = weights.breadcrumb * info.breadcrumbs_collected as f64;
    if info.lap_completed {
        r.lap = weights.lap;
    }
    r.progress = weights.progress * info.progress_delta;
    if info.progress_delta < 0.0 {
        r.backward = -weights.backward * info.progress_delta.abs();
    }
    r.lateral = -weights.lateral * info.lateral_distance;
    r.wall = -weights.wall * info.impact_damage;
    // Speed-scaled, so fast cornering is what hurts; curvature alone is not
    // penalised.
    r.corner = -weights.corner * info.speed_fraction * info.curvature_deviation;
    r.time = -weights.time;
    if info.steer_delta < weights.smooth_steer_threshold {
        r.smooth = weights.smooth;
    }
    if info.health_depleted || info.stuck {
        r.death = -weights.death;
    }

    r.total = r.breadcrumb
        + r.lap
        + r.progress
        + r.backward
        + r.lateral
        + r.wall
        + r.corner
        + r.time
        + r.smooth
        + r.death;
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_tick() -> StepInfo {
        StepInfo {
            steer_delta: 1.0, // above any default smoothness threshold
            ..StepInfo::default()
        }
    }

    #[test]
    fn test_quiet_tick_pays_only_time() {
        let weights = RewardWeights::default();
        let r = compute_reward(&quiet_tick(), &weights);
        assert_eq!(r.breadcrumb, 0.0);
        assert_eq!(r.lap, 0.0);
        assert!((r.time + weights.time).abs() < 1e-12);
        assert!((r.total - r.time).abs() < 1e-12);
    }

    #[test]
    fn test_breadcrumbs_and_lap_pay_out() {
        let weights = RewardWeights::default();
        let info = StepInfo {
            breadcrumbs_collected: 2,
            lap_completed: true,
            ..quiet_tick()
        };
        let r = compute_reward(&info, &weights);
        assert!((r.breadcrumb - 2.0 * weights.breadcrumb).abs() < 1e-12);
        assert!((r.lap - weights.lap).abs() < 1e-12);
    }

    #[test]
    fn test_backward_motion_is_double_penalised() {
        let weights = RewardWeights::default();
        let info = StepInfo {
            progress_delta: -10.0,
            ..quiet_tick()
        };
        let r = compute_reward(&info, &weights);
        assert!(r.progress < 0.0, "signed progress term goes negative");
        assert!(r.backward < 0.0, "and the backward term piles on");

        let forward = StepInfo {
            progress_delta: 10.0,
            ..quiet_tick()
        };
        let rf = compute_reward(&forward, &weights);
        assert!(rf.progress > 0.0);
        assert_eq!(rf.backward, 0.0);
    }

    #[test]
    fn test_corner_penalty_scales_with_speed() {
        let weights = RewardWeights::default();
        let slow = StepInfo {
            speed_fraction: 0.1,
            curvature_deviation: 0.8,
            ..quiet_tick()
        };
        let fast = StepInfo {
            speed_fraction: 1.0,
            curvature_deviation: 0.8,
            ..quiet_tick()
        };
        let r_slow = compute_reward(&slow, &weights);
        let r_fast = compute_reward(&fast, &weights);
        assert!(r_fast.corner < r_slow.corner, "same curve, faster costs more");
        // Pure curvature with no speed costs nothing.
        let parked = StepInfo {
            speed_fraction: 0.0,
            curvature_deviation: 1.0,
            ..quiet_tick()
        };
        assert_eq!(compute_reward(&parked, &weights).corner, 0.0);
    }

    #[test]
    fn test_smoothness_bonus_threshold() {
        let weights = RewardWeights::default();
        let steady = StepInfo {
            steer_delta: weights.smooth_steer_threshold * 0.5,
            ..StepInfo::default()
        };
        let jittery = StepInfo {
            steer_delta: weights.smooth_steer_threshold * 2.0,
            ..StepInfo::default()
        };
        assert!(compute_reward(&steady, &weights).smooth > 0.0);
        assert_eq!(compute_reward(&jittery, &weights).smooth, 0.0);
    }

    #[test]
    fn test_death_penalty_on_either_termination() {
        let weights = RewardWeights::default();
        let crashed = StepInfo {
            health_depleted: true,
            ..quiet_tick()
        };
        let stalled = StepInfo {
            stuck: true,
            ..quiet_tick()
        };
        assert!((compute_reward(&crashed, &weights).death + weights.death).abs() < 1e-12);
        assert!((compute_reward(&stalled, &weights).death + weights.death).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights_disable_components() {
        let weights = RewardWeights {
            breadcrumb: 0.0,
            lap: 0.0,
            progress: 0.0,
            backward: 0.0,
            lateral: 0.0,
            wall: 0.0,
            corner: 0.0,
            time: 0.0,
            smooth: 0.0,
            smooth_steer_threshold: 0.1,
            death: 0.0,
        };
        let info = StepInfo {
            breadcrumbs_collected: 3,
            lap_completed: true,
            progress_delta: -5.0,
            lateral_distance: 20.0,
            impact_damage: 12.0,
            speed_fraction: 1.0,
            curvature_deviation: 1.0,
            steer_delta: 0.0,
            health_depleted: true,
            ..StepInfo::default()
        };
        let r = compute_reward(&info, &weights);
        assert_eq!(r.total, r.smooth, "only the (zero-weight) smooth term fires");
        assert_eq!(r.total, 0.0);
    }
}
