use std::fs;
use std::path::{Path, PathBuf};

use crate::governor::domain::governor_config::{ConfigError, GovernorConfig};
use crate::shared::constants::{CONFIG_DIR_NAME, GOVERNOR_CONFIG_FILE};

/// Default location of governor overrides:
/// `<platform config dir>/backdrop-sampler/governor.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(GOVERNOR_CONFIG_FILE))
}

/// Reads and validates a governor config file.
pub fn load(path: &Path) -> Result<GovernorConfig, ConfigError> {
    let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    GovernorConfig::from_json(&json)
}

/// Loads overrides from `path`, or the default location when `None`.
///
/// A missing file silently yields defaults; an unreadable or invalid one is
/// logged and also yields defaults.
pub fn load_or_default(path: Option<&Path>) -> GovernorConfig {
    let path = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(p) => p,
        None => return GovernorConfig::default(),
    };
    if !path.exists() {
        return GovernorConfig::default();
    }
    match load(&path) {
        Ok(config) => {
            log::info!("Loaded governor tuning from {}", path.display());
            config
        }
        Err(e) => {
            log::warn!("Ignoring governor tuning, using defaults: {e}");
            GovernorConfig::default()
        }
    }
}

/// Writes `config` as pretty JSON, creating parent directories.
pub fn save(config: &GovernorConfig, path: &Path) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).map_err(write_err)
}
