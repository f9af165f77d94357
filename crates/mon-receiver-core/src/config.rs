//! Receiver configuration
//!
//! One JSON file with a section per stage. Every field is optional; missing
//! values fall back to the built-in defaults.
//!
//! ```json
//! {
//!   "link": { "device_patterns": ["/dev/ttyUSB", "/dev/ttyACM"], "probe_timeout_ms": 1000 },
//!   "sink": { "batch_size": 50 },
//!   "influx": { "url": "http://influx.local:8086", "database": "hdvent_data" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::link::LinkConfig;
use crate::sink::{InfluxConfig, SinkConfig};

/// Errors that can occur while loading the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Could not read config {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON for this schema
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Parser error
        #[source]
        source: serde_json::Error,
    },

    /// A value parsed but cannot be used
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// Dotted path of the offending field
        field: String,
        /// What is wrong with it
        message: String,
    },
}

/// Complete receiver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Serial link settings
    pub link: LinkConfig,
    /// Queue and batching settings
    pub sink: SinkConfig,
    /// InfluxDB connection settings
    pub influx: InfluxConfig,
}

impl ReceiverConfig {
    /// Conventional location: `<config dir>/mon-receiver/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mon-receiver").join("config.json"))
    }

    /// Parse configuration from a JSON string
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, message: &str| {
            Err(ConfigError::InvalidValue {
                field: field.to_string(),
                message: message.to_string(),
            })
        };

        if self.link.device_patterns.is_empty() {
            return invalid("link.device_patterns", "at least one pattern is required");
        }
        if self.link.probe_bytes == 0 {
            return invalid("link.probe_bytes", "must be greater than zero");
        }
        if self.sink.batch_size == 0 {
            return invalid("sink.batch_size", "must be greater than zero");
        }
        if self.sink.max_pending < self.sink.batch_size {
            return invalid("sink.max_pending", "must not be below sink.batch_size");
        }
        Ok(())
    }
}
