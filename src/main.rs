use clap::Parser;
use driftsim::driver::ScriptedDriver;
use driftsim::{
    track, InputState, RaceController, RacePhase, RaceSignals, SimConfig, TrackLoader,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless drift-racing simulation demo", long_about = None)]
struct Args {
    /// Path to a driftsim.toml configuration file
    #[arg(short, long, default_value = "./driftsim.toml")]
    config: String,

    /// Track file (JSON or YAML); the built-in oval is used when omitted
    #[arg(short, long)]
    track: Option<String>,

    /// Laps to race (overrides the configured target)
    #[arg(short, long)]
    laps: Option<u32>,

    /// Safety cap on simulated ticks
    #[arg(long, default_value_t = 120_000)]
    max_ticks: u64,

    /// Pull the handbrake through tight sections
    #[arg(long)]
    drift: bool,

    /// Override log level (trace|debug|info|warn|error)
    #[arg(short = 'v', long)]
    log_level: Option<String>,
}

/// Formats a lap duration as `m:ss.mmm`.
fn format_lap_time(ticks: u32, tick_rate_hz: u32) -> String {
    let total_secs = ticks as f64 / tick_rate_hz as f64;
    let mins = (total_secs / 60.0).floor() as u32;
    let secs = total_secs - mins as f64 * 60.0;
    if mins > 0 {
        format!("{}:{:06.3}", mins, secs)
    } else {
        format!("{:.3}s", secs)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = args.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let mut config = SimConfig::load_or_default(&args.config);
    if let Some(laps) = args.laps {
        config.target_laps = laps;
    }
    if config.target_laps == 0 {
        warn!("no lap target configured; defaulting to 3");
        config.target_laps = 3;
    }

    let track = match &args.track {
        Some(path) => {
            info!("loading track from {path}");
            TrackLoader::load_from_file(path, &config)?
        }
        None => {
            info!("no track file given; using the built-in oval");
            track::demo_circuit(&config)?
        }
    };
    info!(
        "track '{}': {:.0} units around, {} gates, {} breadcrumbs",
        track.name,
        track.perimeter,
        track.checkpoints.len(),
        track.breadcrumbs.len()
    );

    let mut state = driftsim::reset(&track, &config)?;
    let mut controller = RaceController::new(&config);
    let driver = ScriptedDriver {
        handbrake_threshold: args.drift.then_some(0.35),
        ..ScriptedDriver::default()
    };

    let mut signals = RaceSignals {
        start_game: true,
        ..RaceSignals::default()
    };
    let mut breadcrumbs_collected: u64 = 0;
    let mut total_reward = 0.0;
    let mut ticks: u64 = 0;

    while controller.phase != RacePhase::Finished && ticks < args.max_ticks {
        let input = if controller.phase == RacePhase::Racing {
            driver.drive(&track, &config, &state.car)
        } else {
            InputState::default()
        };

        if let Some(step_info) = controller.advance(&track, &config, &mut state, &input, &signals) {
            breadcrumbs_collected += step_info.breadcrumbs_collected as u64;
            total_reward += driftsim::compute_reward(&step_info, &config.reward).total;
            if step_info.lap_completed {
                info!(
                    "lap {} completed (session best {})",
                    state.timing.current_lap - 1,
                    format_lap_time(state.timing.best_lap_ticks, config.tick_rate_hz),
                );
            }
            if step_info.stuck {
                warn!("car stuck at tick {ticks}; respawning");
            }
        }
        signals = RaceSignals::default();
        ticks += 1;
    }

    if controller.phase == RacePhase::Finished {
        info!("race finished after {} laps", config.target_laps);
    } else {
        warn!("tick cap reached before the race finished");
    }
    info!(
        "summary: {} race ticks, best lap {}, {} breadcrumbs, health {:.0}/{:.0}, return {:.1}",
        state.timing.total_race_ticks,
        if state.timing.best_lap_ticks > 0 {
            format_lap_time(state.timing.best_lap_ticks, config.tick_rate_hz)
        } else {
            "-".to_string()
        },
        breadcrumbs_collected,
        state.car.health,
        config.max_health,
        total_reward,
    );

    Ok(())
}
