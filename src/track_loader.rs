//! Track file loading.
//!
//! Tracks are authored as JSON or YAML: a name, ordered control points, and
//! checkpoint entries (exactly one of them the finish line). Geometry
//! options come from the simulation configuration, so the same file can be
//! built at different widths.

use crate::config::SimConfig;
use crate::track::{self, Track, TrackBuildError};
use crate::geometry::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TrackLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid track data: {0}")]
    InvalidData(String),
}

impl From<TrackBuildError> for TrackLoadError {
    fn from(err: TrackBuildError) -> Self {
        TrackLoadError::InvalidData(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackFileFormat {
    pub name: String,
    /// Stable identity for persisted best-lap keys; generated when absent.
    #[serde(default)]
    pub track_id: Option<String>,
    pub control_points: Vec<[f64; 2]>,
    pub checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Centerline vertex index the gate sits on.
    pub index: usize,
    #[serde(default)]
    pub finish: bool,
}

pub struct TrackLoader;

impl TrackLoader {
    pub fn load_from_file<P: AsRef<Path>>(
        path: P,
        config: &SimConfig,
    ) -> Result<Track, TrackLoadError> {
        let content = fs::read_to_string(path)?;
        Self::load_from_string(&content, config)
    }

    pub fn load_from_string(content: &str, config: &SimConfig) -> Result<Track, TrackLoadError> {
        let track_file: TrackFileFormat = if content.trim_start().starts_with('{') {
            serde_json::from_str(content)
                .map_err(|e| TrackLoadError::Parse(format!("JSON parse error: {e}")))?
        } else {
            serde_yaml::from_str(content)
                .map_err(|e| TrackLoadError::Parse(format!("YAML parse error: {e}")))?
        };
        Self::build(track_file, config)
    }

    fn build(track_file: TrackFileFormat, config: &SimConfig) -> Result<Track, TrackLoadError> {
        let finish_count = track_file.checkpoints.iter().filter(|c| c.finish).count();
        if finish_count != 1 {
            return Err(TrackLoadError::InvalidData(format!(
                "exactly one checkpoint must be the finish, found {finish_count}"
            )));
        }
        let finish = track_file
            .checkpoints
            .iter()
            .position(|c| c.finish)
            .expect("checked above");

        let id = match &track_file.track_id {
            Some(raw) => Some(Uuid::parse_str(raw).map_err(|e| {
                TrackLoadError::InvalidData(format!("invalid track_id format: {e}"))
            })?),
            None => None,
        };

        let control_points: Vec<Vec2> = track_file
            .control_points
            .iter()
            .map(|&[x, y]| Vec2::new(x, y))
            .collect();
        let checkpoint_indices: Vec<usize> =
            track_file.checkpoints.iter().map(|c| c.index).collect();

        Ok(track::build(
            &track_file.name,
            id,
            &control_points,
            &checkpoint_indices,
            finish,
            config,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SQUARE_YAML: &str = r#"
name: Loader Square
track_id: 9f8d2c40-51a3-4a3f-9b77-0f4b8f6f2e11
control_points:
  - [200.0, 0.0]
  - [400.0, 0.0]
  - [600.0, 0.0]
  - [600.0, 200.0]
  - [600.0, 400.0]
  - [600.0, 600.0]
  - [400.0, 600.0]
  - [200.0, 600.0]
  - [0.0, 600.0]
  - [0.0, 400.0]
  - [0.0, 200.0]
  - [0.0, 0.0]
checkpoints:
  - index: 0
    finish: true
  - index: 4
  - index: 8
"#;

    #[test]
    fn test_yaml_track_loads() {
        let config = SimConfig::default();
        let track = TrackLoader::load_from_string(SQUARE_YAML, &config).unwrap();
        assert_eq!(track.name, "Loader Square");
        assert_eq!(track.center_line.len(), 12);
        assert_eq!(track.checkpoints.len(), 3);
        assert!(track.checkpoints[0].is_finish);
        assert_eq!(
            track.id.to_string(),
            "9f8d2c40-51a3-4a3f-9b77-0f4b8f6f2e11"
        );
    }

    #[test]
    fn test_json_track_loads() {
        let config = SimConfig::default();
        let json = r#"{
            "name": "JSON Triangle",
            "control_points": [[0.0, 0.0], [800.0, 0.0], [400.0, 700.0]],
            "checkpoints": [{"index": 0, "finish": true}, {"index": 1}]
        }"#;
        let track = TrackLoader::load_from_string(json, &config).unwrap();
        assert_eq!(track.name, "JSON Triangle");
        assert_eq!(track.checkpoints.len(), 2);
    }

    #[test]
    fn test_missing_finish_is_rejected() {
        let config = SimConfig::default();
        let json = r#"{
            "name": "No Finish",
            "control_points": [[0.0, 0.0], [800.0, 0.0], [400.0, 700.0]],
            "checkpoints": [{"index": 0}, {"index": 1}]
        }"#;
        let err = TrackLoader::load_from_string(json, &config).unwrap_err();
        assert!(matches!(err, TrackLoadError::InvalidData(_)));
    }

    #[test]
    fn test_two_finishes_are_rejected() {
        let config = SimConfig::default();
        let json = r#"{
            "name": "Two Finishes",
            "control_points": [[0.0, 0.0], [800.0, 0.0], [400.0, 700.0]],
            "checkpoints": [{"index": 0, "finish": true}, {"index": 1, "finish": true}]
        }"#;
        assert!(TrackLoader::load_from_string(json, &config).is_err());
    }

    #[test]
    fn test_build_errors_surface_as_invalid_data() {
        let config = SimConfig::default();
        let json = r#"{
            "name": "Bad Index",
            "control_points": [[0.0, 0.0], [800.0, 0.0], [400.0, 700.0]],
            "checkpoints": [{"index": 40, "finish": true}]
        }"#;
        let err = TrackLoader::load_from_string(json, &config).unwrap_err();
        assert!(matches!(err, TrackLoadError::InvalidData(_)));
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let config = SimConfig::default();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SQUARE_YAML.as_bytes()).unwrap();
        let track = TrackLoader::load_from_file(file.path(), &config).unwrap();
        assert_eq!(track.name, "Loader Square");
    }

    #[test]
    fn test_bundled_demo_track_parses() {
        let config = SimConfig::default();
        let content = include_str!("../content/tracks/demo_oval.yaml");
        let track = TrackLoader::load_from_string(content, &config).unwrap();
        assert!(track.checkpoints.iter().filter(|g| g.is_finish).count() == 1);
        assert!(track.perimeter > 1000.0);
    }
}
