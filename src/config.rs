//! User configuration stored as JSON in the platform config directory.

use crate::error::{Error, Result};
use crate::index::IndexConfig;
use crate::regex::scanner::SCAN_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "trigrep";
const CONFIG_FILE: &str = "config.json";

/// Directory search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Worker threads; 0 means one per available core
    pub threads: usize,
    /// Narrow candidates with the trigram index before scanning
    pub use_index: bool,
    /// Capacity of the result channel
    pub channel_capacity: usize,
    /// Only search paths matching this glob
    pub glob: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            use_index: true,
            channel_capacity: SCAN_CHANNEL_CAPACITY,
            glob: None,
        }
    }
}

impl SearchConfig {
    /// Resolve `threads`, treating 0 as the core count
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.threads
        }
    }
}

/// Everything read from `config.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub search: SearchConfig,
}

impl AppConfig {
    /// Load from the config directory, or defaults if there is no file
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| Error::Config {
            message: format!("{}: {e}", path.display()),
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(path, content).map_err(|e| Error::io(path, e))
    }
}

/// `<config_dir>/trigrep/config.json`, if the platform has a config dir
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
}
