//! MatrixBus configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main MatrixBus configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Data bus settings
    pub databus: DataBusConfig,
}

impl Config {
    /// Load configuration with fallback chain
    ///
    /// Explicit path, then `./matrixbus.yml`, then
    /// `~/.config/matrixbus/matrixbus.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => Some(path.clone()),
            None => Self::default_paths().into_iter().find(|p| p.exists()),
        }?;
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<Config>(&content).ok()?.log_level
    }

    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("matrixbus.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("matrixbus").join("matrixbus.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Data bus configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataBusConfig {
    /// Shared deadline for every request of one fetch or push, in milliseconds
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    debug!("default_timeout_ms: called");
    5_000
}

impl Default for DataBusConfig {
    fn default() -> Self {
        debug!("DataBusConfig::default: called");
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl DataBusConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Get the shared request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        debug!(timeout_ms = %self.timeout_ms, "DataBusConfig::timeout: called");
        Duration::from_millis(self.timeout_ms)
    }
}
