use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub alarms: AlarmConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            alarms: AlarmConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub default_model: Option<String>,
    pub default_provider: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: None,
            default_provider: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AlarmConfig {
    /// Scan interval for the notification scheduler, in seconds.
    pub tick_secs: u64,
    /// Lead times at which an entity fires, in whole minutes.
    pub offsets_min: Vec<i64>,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            tick_secs: 30,
            offsets_min: crate::alarm::DEFAULT_ALERT_OFFSETS_MIN.to_vec(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory for domain store files.
    pub data_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}
