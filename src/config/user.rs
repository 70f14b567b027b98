//! Configuration file loading.
//!
//! User config location: $XDG_CONFIG_HOME/utsushi/utsushi.toml
//! Fallback: the platform config directory (`dirs::config_dir()`).

use std::path::{Path, PathBuf};

use super::ConfigError;
use super::settings::SettingsFile;

const CONFIG_DIR_NAME: &str = "utsushi";
const CONFIG_FILE_NAME: &str = "utsushi.toml";

/// Returns the path to the user configuration file.
///
/// Returns None if neither $XDG_CONFIG_HOME nor a platform config directory
/// is available.
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Some(
            PathBuf::from(xdg_config)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_FILE_NAME),
        );
    }

    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Read and parse a settings file.
pub fn load_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the user configuration file if it exists.
pub fn load_user_config() -> Result<Option<SettingsFile>, ConfigError> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        log::debug!(
            target: "utsushi::config",
            "No user config at {}",
            path.display()
        );
        return Ok(None);
    }
    load_settings_file(&path).map(Some)
}
