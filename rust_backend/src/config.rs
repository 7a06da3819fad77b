//! Engine configuration file support.
//!
//! The configuration is read once per batch invocation and handed to every
//! service call; nothing in the engine reads it from global state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::MoeThresholds;
use crate::moe::DynamicMoe;

/// Default name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "tetres.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No tetres.toml found in any of the search locations")]
    NotFound,
}

/// Engine configuration from file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// System-wide default thresholds, used for routes without an override.
    #[serde(default)]
    pub moe: MoeThresholds,
    #[serde(default)]
    pub travel_time: TravelTimeSettings,
    #[serde(default)]
    pub repository: RepositorySettings,
}

/// Sampling settings of the travel-time table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelTimeSettings {
    /// Seconds between two rows of the same route.
    #[serde(default = "default_data_interval")]
    pub data_interval: i64,
    /// Miles between two virtual nodes.
    #[serde(default = "default_virtual_node_distance")]
    pub virtual_node_distance: f64,
}

/// Repository type settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

fn default_data_interval() -> i64 {
    300
}

fn default_virtual_node_distance() -> f64 {
    0.1
}

fn default_repo_type() -> String {
    "local".to_string()
}

impl Default for TravelTimeSettings {
    fn default() -> Self {
        Self {
            data_interval: default_data_interval(),
            virtual_node_distance: default_virtual_node_distance(),
        }
    }
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load engine configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load engine configuration from the default location.
    ///
    /// Searches for `tetres.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> Result<Self, ConfigError> {
        Self::search_paths()
            .into_iter()
            .find(|p| p.exists())
            .ok_or(ConfigError::NotFound)
            .and_then(Self::from_file)
    }

    fn search_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("rust_backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ]
    }

    /// Check value ranges; called by every loader.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.travel_time.data_interval <= 0 {
            return Err(ConfigError::Invalid(format!(
                "travel_time.data_interval must be positive, got {}",
                self.travel_time.data_interval
            )));
        }
        if self.travel_time.virtual_node_distance <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "travel_time.virtual_node_distance must be positive, got {}",
                self.travel_time.virtual_node_distance
            )));
        }
        let m = &self.moe;
        if m.critical_density <= 0.0 || m.lane_capacity <= 0.0 || m.congestion_threshold_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "moe thresholds must be positive, got {:?}",
                m
            )));
        }
        Ok(())
    }

    /// Snapshot formulas for rows sampled every `interval_seconds`.
    pub fn dynamic_moe(&self, interval_seconds: i64) -> DynamicMoe {
        DynamicMoe::new(interval_seconds, self.travel_time.virtual_node_distance)
    }
}
