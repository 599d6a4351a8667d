//! Configuration file discovery and loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "lectern";
const CONFIG_FILE: &str = "config.toml";

/// Locate the bootstrap configuration file for the platform.
///
/// On Linux, `~/.config/lectern/config.toml` is preferred over
/// `/etc/lectern/config.toml`. Other platforms use the user config directory.
pub fn find_config_file() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE));

    if let Some(path) = user_config.as_ref() {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    match user_config {
        Some(path) => Err(Error::Config(format!("Config file not found: {:?}", path))),
        None => Err(Error::Config(
            "Could not determine config directory".to_string(),
        )),
    }
}

/// Parse a TOML configuration file into `T`.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!("Loading configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
}
