//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::parse_duration;
use crate::storage::StorageConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Query cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached query result stays valid (e.g. "5m", "300s")
    #[serde(default = "default_ttl")]
    pub ttl: String,
}

fn default_ttl() -> String {
    "5m".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl: default_ttl() }
    }
}

impl CacheConfig {
    /// Parsed TTL. Falls back to five minutes if the string is unparseable.
    pub fn ttl(&self) -> Duration {
        parse_duration(&self.ttl).unwrap_or(Duration::from_secs(300))
    }
}

/// Collision log ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Directory the simulation writes collision logs into
    #[serde(default = "default_simulations_dir")]
    pub simulations_dir: PathBuf,

    /// Glob matched against file names inside `simulations_dir`
    #[serde(default = "default_log_pattern")]
    pub log_pattern: String,

    /// Trailing rows examined when looking for the winner
    #[serde(default = "default_winner_scan_rows")]
    pub winner_scan_rows: usize,

    /// Also write the `ranking` table for each ingested battle
    #[serde(default = "default_write_ranking")]
    pub write_ranking: bool,
}

fn default_simulations_dir() -> PathBuf {
    PathBuf::from("./simulations")
}

fn default_log_pattern() -> String {
    "*_collision_log.csv".to_string()
}

fn default_winner_scan_rows() -> usize {
    10
}

fn default_write_ranking() -> bool {
    true
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            simulations_dir: default_simulations_dir(),
            log_pattern: default_log_pattern(),
            winner_scan_rows: default_winner_scan_rows(),
            write_ranking: default_write_ranking(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub ingest: IngestSettings,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            cache: CacheConfig::default(),
            ingest: IngestSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match parse_duration(&self.cache.ttl) {
            None => {
                return Err(ConfigError::ValidationError(format!(
                    "Cache TTL is not a valid duration: {:?}",
                    self.cache.ttl
                )));
            }
            Some(ttl) if ttl.is_zero() => {
                return Err(ConfigError::ValidationError(
                    "Cache TTL must be greater than 0".to_string(),
                ));
            }
            Some(_) => {}
        }

        if self.ingest.winner_scan_rows == 0 {
            return Err(ConfigError::ValidationError(
                "Winner scan rows must be greater than 0".to_string(),
            ));
        }

        if self.ingest.log_pattern.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Log pattern must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig::new(self.data_dir.clone())
    }
}
