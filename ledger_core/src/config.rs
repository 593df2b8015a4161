//! Configuration file support for Overlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/overlog/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub progression: ProgressionConfig,
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

/// Session clustering configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum gap between sets of the same session, in hours.
    #[serde(default = "default_threshold_hours")]
    pub threshold_hours: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            threshold_hours: default_threshold_hours(),
        }
    }
}

/// Progression suggestion tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Weight added when switching to the weight strategy.
    #[serde(default = "default_weight_increment")]
    pub weight_increment: f64,

    /// Rep count at which the suggestion switches from reps to weight.
    #[serde(default = "default_rep_target")]
    pub rep_target: u32,

    /// Reps never drop below this after a weight increase.
    #[serde(default = "default_rep_floor")]
    pub rep_floor: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            weight_increment: default_weight_increment(),
            rep_target: default_rep_target(),
            rep_floor: default_rep_floor(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("overlog")
}

fn default_threshold_hours() -> f64 {
    2.0
}

fn default_weight_increment() -> f64 {
    2.5
}

fn default_rep_target() -> u32 {
    12
}

fn default_rep_floor() -> u32 {
    8
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("overlog").join("config.toml")
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

    fn validate(&self) -> Result<()> {
        if !crate::session::threshold_hours_in_bounds(self.session.threshold_hours) {
            return Err(Error::Config(format!(
                "session.threshold_hours must be within {}-{}, got {}",
                crate::session::MIN_THRESHOLD_HOURS,
                crate::session::MAX_THRESHOLD_HOURS,
                self.session.threshold_hours
            )));
        }
        if !self.progression.weight_increment.is_finite()
            || self.progression.weight_increment <= 0.0
        {
            return Err(Error::Config(
                "progression.weight_increment must be positive".into(),
            ));
        }
        if self.progression.rep_floor > self.progression.rep_target {
            return Err(Error::Config(
                "progression.rep_floor must not exceed rep_target".into(),
            ));
        }
        Ok(())
    }
}
