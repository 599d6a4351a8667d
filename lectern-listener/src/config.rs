//! Configuration management for lectern-listener
//!
//! Bootstrap settings are read once at startup. Sources, highest priority first:
//!
//! 1. Command-line arguments (`--service-url`)
//! 2. Environment variables (`LECTERN_SERVICE_URL`, `LECTERN_CONFIG`)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! CLI and environment overrides are applied by the binary on top of the
//! value returned by [`ListenerConfig::load`].

use crate::error::{Error, Result};
use lectern_common::session::paths;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Listener configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ListenerConfig {
    /// Base URL of the playback-coordination service
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Path of the session state document on the service
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Interval between session state fetches
    ///
    /// Must exceed a typical request round trip; the runtime never overlaps
    /// fetches but a too-short interval just skips cycles.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Period of the local playback clock
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Timeout applied to every request sent to the service
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Local lead over the session position tolerated before a forced seek
    #[serde(default = "default_drift_tolerance_secs")]
    pub drift_tolerance_secs: f64,

    /// Output device name (default device if not specified)
    #[serde(default)]
    pub audio_device: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_service_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_state_path() -> String {
    paths::APP_STATE.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_frame_interval_ms() -> u64 {
    16 // ~60 Hz display refresh
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_drift_tolerance_secs() -> f64 {
    5.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            state_path: default_state_path(),
            poll_interval_ms: default_poll_interval_ms(),
            frame_interval_ms: default_frame_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            drift_tolerance_secs: default_drift_tolerance_secs(),
            audio_device: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl ListenerConfig {
    /// Load configuration.
    ///
    /// An explicitly named file must exist and parse. Otherwise the platform
    /// config file is used if present, falling back to built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => lectern_common::config::load_toml(path)?,
            None => match lectern_common::config::find_config_file() {
                Ok(path) => {
                    info!("Using configuration file {}", path.display());
                    lectern_common::config::load_toml(&path)?
                }
                Err(e) => {
                    info!("No configuration file ({}), using defaults", e);
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.service_url)
            .map_err(|e| Error::Config(format!("Invalid service_url '{}': {}", self.service_url, e)))?;

        if !self.state_path.starts_with('/') {
            return Err(Error::Config(format!(
                "state_path must start with '/': {}",
                self.state_path
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".to_string()));
        }
        if self.frame_interval_ms == 0 {
            return Err(Error::Config("frame_interval_ms must be positive".to_string()));
        }
        if !self.drift_tolerance_secs.is_finite() || self.drift_tolerance_secs < 0.0 {
            return Err(Error::Config(format!(
                "drift_tolerance_secs must be a non-negative number: {}",
                self.drift_tolerance_secs
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
