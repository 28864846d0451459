//! Configuration file support for Runcoach.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/runcoach/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub training: TrainingConfig,

    #[serde(default)]
    pub minimalist: MinimalistConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Strength training parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Load rounding step used when onboarding a fresh profile, in kg
    #[serde(default = "default_weight_step_kg")]
    pub default_weight_step_kg: f64,

    /// Suggested rest between sets, in seconds
    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            default_weight_step_kg: default_weight_step_kg(),
            rest_seconds: default_rest_seconds(),
        }
    }
}

/// Minimalist transition parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MinimalistConfig {
    /// Runs per week assumed when splitting weekly volume into single runs
    #[serde(default = "default_assumed_runs_per_week")]
    pub assumed_runs_per_week: u32,
}

impl Default for MinimalistConfig {
    fn default() -> Self {
        Self {
            assumed_runs_per_week: default_assumed_runs_per_week(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("runcoach")
}

fn default_weight_step_kg() -> f64 {
    2.5
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_assumed_runs_per_week() -> u32 {
    3
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("runcoach").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
