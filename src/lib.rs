//! Headless top-down 2D drift-racing simulation core.
//!
//! The crate is a deterministic fixed-timestep engine: a frozen [`Track`]
//! built once from control points, a pure `step` over a value-typed world
//! state, and a normalised observation/reward surface for learned policies.
//! Rendering, audio, input capture, and training loops are collaborators
//! that consume these types; none of them live here.

pub mod config;
pub mod data;
pub mod driver;
pub mod geometry;
pub mod observation;
pub mod physics;
pub mod progress;
pub mod race_control;
pub mod reward;
pub mod track;
pub mod track_loader;
pub mod world;

pub use config::{ConfigError, RewardWeights, SimConfig};
pub use data::{CarState, InputState, StepInfo, Surface, Timing, WorldState};
pub use geometry::Vec2;
pub use observation::{build_observation, fill_observation, observation_len};
pub use race_control::{RaceController, RacePhase, RaceSignals};
pub use reward::{compute_reward, RewardBreakdown};
pub use track::{Breadcrumb, Gate, Track, TrackBuildError, TrackId};
pub use track_loader::{TrackLoadError, TrackLoader};
pub use world::{reset, reset_from, step};
