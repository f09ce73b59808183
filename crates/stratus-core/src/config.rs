//! Application settings shared by hosts.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level settings, usually read from `stratus.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub autosave: AutosaveConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn autosave(&self) -> &AutosaveConfig {
        &self.autosave
    }

    pub fn storage(&self) -> &StorageConfig {
        &self.storage
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    /// Quiet period after the last edit.
    pub interval_secs: u64,
    /// How often the host polls the debouncer.
    pub tick_millis: u64,
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Never zero, so a host interval timer can be built from it.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: crate::autosave::AUTOSAVE_INTERVAL.as_secs(),
            tick_millis: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured directory, or ~/.stratus.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(crate::data_dir)
    }

    /// Where diagram records live.
    pub fn diagrams_dir(&self) -> PathBuf {
        self.data_dir().join("diagrams")
    }
}
