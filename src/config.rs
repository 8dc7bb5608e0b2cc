//! Configuration loading and management
//!
//! Handles `taskboard.toml` in the data directory. Every field has a
//! default, so a missing file or a partial one is fine.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::kanban_board::SortOption;
use crate::task::Priority;

pub const CONFIG_FILE: &str = "taskboard.toml";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TASKBOARD_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Priority preselected for new tasks
    #[serde(default)]
    pub default_priority: Priority,

    /// Sort applied when the board opens
    #[serde(default)]
    pub default_sort: SortOption,

    #[serde(default)]
    pub ui: UiConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_priority: Priority::Low,
            default_sort: SortOption::None,
            ui: UiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Input poll interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Show the first line of each description under the title
    #[serde(default)]
    pub show_descriptions: bool,
}

fn default_tick_ms() -> u64 {
    250
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            show_descriptions: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate(path)?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if self.ui.tick_ms == 0 || self.ui.tick_ms > 10_000 {
            return Err(Error::InvalidConfig {
                path: path.to_path_buf(),
                message: format!("ui.tick_ms must be in 1..=10000, got {}", self.ui.tick_ms),
            });
        }
        Ok(())
    }
}

/// Platform data directory, or `.taskboard` in the working directory when
/// the platform has none.
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "taskboard")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".taskboard"))
}
