use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{clock::DEFAULT_RESET_HOUR, error::ConfigError};

pub const APP_DIR: &str = "daytimer";
pub const CONFIG_FILE: &str = "config.json";
pub const DEFAULTS_FILE: &str = "defaults.json";
pub const LOG_FILE: &str = "daytimer.log";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Local hour after which the task list is cleared each day.
    pub reset_hour: u32,
    /// Seconds added or removed by one +/- press.
    pub adjust_step_secs: i64,
    pub sound_enabled: bool,
    /// Explicit notification choice; unset means ask on first alert.
    pub notifications: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reset_hour: DEFAULT_RESET_HOUR,
            adjust_step_secs: 60,
            sound_enabled: true,
            notifications: None,
        }
    }
}

impl Config {
    pub fn load(dir: &Path) -> Self {
        load_json(&dir.join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reset_hour > 23 {
            return Err(ConfigError::ResetHour(self.reset_hour));
        }
        if self.adjust_step_secs <= 0 {
            return Err(ConfigError::AdjustStep(self.adjust_step_secs));
        }
        Ok(())
    }
}

/// `--data-dir`, else the platform data dir, else `./daytimer`.
pub fn data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
    })
}

pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> T {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}
