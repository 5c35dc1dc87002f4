//! Runtime configuration.
//!
//! Read from `$UPKEEP_CONFIG` or `<config_dir>/upkeep/config.toml`. A missing
//! file means defaults. `UPKEEP_DB` overrides the data directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UpkeepError};
use crate::storage::default_data_dir;

pub const CONFIG_ENV: &str = "UPKEEP_CONFIG";
pub const DB_ENV: &str = "UPKEEP_DB";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the JSON tables.
    pub data_dir: PathBuf,
    /// Reminders are kept for items overdue or due within this many days.
    pub horizon_days: i64,
    /// Minutes between passes of `upkeep watch`.
    pub watch_interval_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            horizon_days: 90,
            watch_interval_minutes: 60,
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("upkeep");
        p.push("config.toml");
        p
    }

    /// Loads from a TOML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| UpkeepError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| UpkeepError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| UpkeepError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| UpkeepError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| UpkeepError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from the environment-selected or default path, then applies
    /// environment overrides.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        let mut config = Self::load(&path)?;
        if let Ok(dir) = std::env::var(DB_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}
