use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::CoreError;

/// Engine-wide settings, loadable from RON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window radius R: chunks within Chebyshev distance R of the observer stay active.
    pub render_distance: i32,
    /// Directory holding chunk files and the catalog.
    pub world_dir: PathBuf,
    /// Window controller polling period.
    pub controller_interval_ms: u64,
    /// Selection reach in voxels.
    pub max_selection_distance: i32,
    /// Terrain noise seed.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            render_distance: DEFAULT_RENDER_DISTANCE,
            world_dir: PathBuf::from("world"),
            controller_interval_ms: DEFAULT_CONTROLLER_INTERVAL_MS,
            max_selection_distance: DEFAULT_MAX_SELECTION_DISTANCE,
            seed: DEFAULT_SEED,
        }
    }
}

impl EngineConfig {
    pub fn from_ron_str(ron_str: &str) -> Result<Self, CoreError> {
        ron::Options::default()
            .from_str(ron_str)
            .map_err(|e| CoreError::ConfigParse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    /// Side length of the active window, in chunks.
    pub fn window_side(&self) -> u32 {
        (self.render_distance.max(0) as u32) * 2 + 1
    }

    /// Chunks that can be active at once; sizes the GPU slot arena.
    pub fn max_active_chunks(&self) -> u32 {
        self.window_side() * self.window_side()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.render_distance, 5);
        assert_eq!(config.max_active_chunks(), 121);
        assert_eq!(config.world_dir, PathBuf::from("world"));
        assert_eq!(config.controller_interval_ms, 200);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = EngineConfig::from_ron_str("(render_distance: 1, world_dir: \"saves/a\")")
            .expect("parse");
        assert_eq!(config.render_distance, 1);
        assert_eq!(config.max_active_chunks(), 9);
        assert_eq!(config.world_dir, PathBuf::from("saves/a"));
        assert_eq!(config.seed, DEFAULT_SEED);
    }

    #[test]
    fn test_bad_ron_reports_parse_error() {
        let result = EngineConfig::from_ron_str("(render_distance: \"far\")");
        assert!(matches!(result, Err(CoreError::ConfigParse(_))));
    }
}
