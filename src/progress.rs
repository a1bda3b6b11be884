//! Lap, checkpoint, and breadcrumb accounting.
//!
//! Gates are validated in order-as-a-set: a lap is credited only when every
//! intermediate gate has been crossed since the last credit and the finish
//! gate is the crossing under consideration. The breadcrumb chain is
//! independent of gate logic and advances sequentially, with a wrap-safe
//! auto-advance so one missed crumb never locks the rest of the chain.

use crate::config::SimConfig;
use crate::data::{CarState, Timing};
use crate::geometry::segment_intersection;
use crate::track::Track;

/// What the lap machinery observed this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressOutcome {
    /// Breadcrumbs collected by proximity; auto-advances are not counted.
    pub breadcrumbs_collected: u32,
    pub lap_completed: bool,
    /// Highest-numbered gate validly crossed this tick, if any.
    pub gate_crossed: Option<usize>,
}

/// Runs gate and breadcrumb accounting for one tick. Requires the car's
/// centerline projection (`track_s`) to be current.
pub fn update_lap_progress(
    car: &CarState,
    timing: &mut Timing,
    track: &Track,
    config: &SimConfig,
    tick: u64,
) -> ProgressOutcome {
    let mut outcome = ProgressOutcome::default();
    timing.lap_completed = false;

    // A crossing only counts with real forward speed, outside the reset
    // grace window. Reverse crossings and spawn overlap earn nothing.
    let crossing_valid = car.speed > config.min_checkpoint_speed && tick >= config.grace_ticks;

    if crossing_valid {
        for (i, gate) in track.checkpoints.iter().enumerate() {
            let crossed =
                segment_intersection(car.prev_position, car.position, gate.left, gate.right)
                    .is_some();
            if !crossed {
                continue;
            }
            if gate.is_finish {
                // Evaluated at crossing time, so an intermediate taken
                // earlier in this same tick still counts.
                let intermediates_done = (0..track.checkpoints.len())
                    .filter(|&j| !track.checkpoints[j].is_finish)
                    .all(|j| timing.gate_crossed(j));
                if intermediates_done {
                    timing.current_lap += 1;
                    let lap_ticks = timing.current_lap_ticks;
                    if timing.best_lap_ticks == 0 || lap_ticks < timing.best_lap_ticks {
                        timing.best_lap_ticks = lap_ticks;
                    }
                    timing.current_lap_ticks = 0;
                    timing.crossed_gates = 0;
                    timing.lap_completed = true;
                    timing.last_gate = Some(i);
                    outcome.lap_completed = true;
                    outcome.gate_crossed = Some(i);
                }
            } else {
                timing.mark_gate(i);
                timing.last_gate = Some(i);
                outcome.gate_crossed = Some(i);
            }
        }
    }

    // Breadcrumb chain. Bounded to one full wrap so a degenerate state can
    // never spin forever.
    let crumbs = &track.breadcrumbs;
    if !crumbs.is_empty() {
        let m = crumbs.len();
        let collect_valid = car.speed > config.min_checkpoint_speed;
        for _ in 0..m {
            let target = crumbs[timing.next_breadcrumb];
            if collect_valid
                && car.position.distance(target.position) <= config.breadcrumb_radius
            {
                timing.next_breadcrumb = (timing.next_breadcrumb + 1) % m;
                outcome.breadcrumbs_collected += 1;
                continue;
            }
            // Chain-lock escape: if the car has run well past the target,
            // skip it without paying reward.
            let ahead = track.arc_delta(target.s, car.track_s);
            if ahead
                > config.breadcrumb_spacing * config.breadcrumb_auto_advance_multiplier
            {
                timing.next_breadcrumb = (timing.next_breadcrumb + 1) % m;
                continue;
            }
            break;
        }
    }

    outcome
}
