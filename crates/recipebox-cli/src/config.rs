//! Application configuration management.
//!
//! Configuration is stored at `~/.config/recipebox/config.json`. Every field
//! is optional; `RECIPEBOX_DATA_DIR` and `RECIPEBOX_ORIGIN` override the file.

use std::path::PathBuf;

use anyhow::Result;
use recipebox_core::{MergePolicy, WorkerConfig};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "recipebox";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DATA_DIR_ENV: &str = "RECIPEBOX_DATA_DIR";
const ORIGIN_ENV: &str = "RECIPEBOX_ORIGIN";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Where collections and caches live; defaults to the platform data dir
    pub data_dir: Option<PathBuf>,
    /// Also write logs to a daily rolling file here
    pub log_dir: Option<PathBuf>,
    pub merge_policy: MergePolicy,
    pub worker: WorkerConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.is_empty() {
                self.data_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(origin) = std::env::var(ORIGIN_ENV) {
            if !origin.is_empty() {
                self.worker.origin = origin;
            }
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Directory holding one JSON file per collection.
    pub fn collections_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("collections"))
    }

    /// Directory holding the worker's cache storage.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("caches"))
    }
}
