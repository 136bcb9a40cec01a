use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jobwatch_engine::EngineConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::platform::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "jobwatch.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

/// Settings read from `jobwatch.ron`. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub max_export_mb: u64,
    /// Remembered job, scenario and theme.
    pub state_file: PathBuf,
    /// Default directory for spreadsheet exports.
    pub output_dir: PathBuf,
    pub log: LogDestination,
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            base_url: engine.base_url,
            poll_interval_ms: engine.poll_interval.as_millis() as u64,
            connect_timeout_secs: engine.connect_timeout.as_secs(),
            request_timeout_secs: None,
            max_export_mb: engine.max_export_bytes / (1024 * 1024),
            state_file: PathBuf::from(".jobwatch_state.ron"),
            output_dir: PathBuf::from("exports"),
            log: LogDestination::File,
            verbose: false,
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `./jobwatch.ron` when present, or defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Self::parse(&text).map_err(|message| ConfigError::Parse { path, message })?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|err| err.to_string())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                message: "must be positive".to_string(),
            });
        }
        url::Url::parse(&self.base_url).map_err(|err| ConfigError::Invalid {
            field: "base_url",
            message: err.to_string(),
        })?;
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            base_url: self.base_url.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            max_export_bytes: self.max_export_mb.saturating_mul(1024 * 1024),
        }
    }
}
