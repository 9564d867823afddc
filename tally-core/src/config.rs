//! Configuration management
//!
//! Reads settings.json from the data directory:
//! ```json
//! {
//!   "app": { ... },
//!   "hashing": { "timeCost": 3, "memoryCost": 65536, "parallelism": 4 }
//! }
//! ```
//! Fields this engine does not manage are preserved on save.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::result::Result;

/// Default Argon2id cost parameters (64 MiB, three passes)
const DEFAULT_TIME_COST: u32 = 3;
const DEFAULT_MEMORY_COST: u32 = 65536;
const DEFAULT_PARALLELISM: u32 = 4;

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: HashMap<String, serde_json::Value>,
    #[serde(default)]
    hashing: HashingSettings,
}

/// Argon2id cost settings for credential hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashingSettings {
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,
    /// In KiB, per the argon2 parameter convention
    #[serde(default = "default_memory_cost")]
    pub memory_cost: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_time_cost() -> u32 {
    DEFAULT_TIME_COST
}
fn default_memory_cost() -> u32 {
    DEFAULT_MEMORY_COST
}
fn default_parallelism() -> u32 {
    DEFAULT_PARALLELISM
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            time_cost: DEFAULT_TIME_COST,
            memory_cost: DEFAULT_MEMORY_COST,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

/// Tally configuration (simplified view of settings)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub hashing: HashingSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the data directory. A missing or unparseable
    /// settings file falls back to defaults rather than failing startup.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        Ok(Self {
            hashing: raw.hashing.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory, preserving settings this engine
    /// doesn't manage.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.hashing = self.hashing.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}
