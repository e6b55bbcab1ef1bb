//! Configuration file support for StretchFlow.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/stretchflow/config.toml`.

use crate::types::{Category, Difficulty, Exercise};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub quick_pick: QuickPickConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
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

/// Parameters for the randomized "quick stretch" selection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuickPickConfig {
    #[serde(default = "default_quick_pick_count")]
    pub count: usize,

    #[serde(default = "default_quick_max_duration")]
    pub max_duration_seconds: u32,
}

impl Default for QuickPickConfig {
    fn default() -> Self {
        Self {
            count: default_quick_pick_count(),
            max_duration_seconds: default_quick_max_duration(),
        }
    }
}

/// Custom exercise definition merged into the built-in catalog
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomExercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub duration_seconds: u32,
    pub instructions: Vec<String>,
    pub category: Category,
    #[serde(default)]
    pub target_muscles: Vec<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
}

impl CustomExercise {
    /// Convert to a full catalog exercise
    pub fn to_exercise(&self) -> Exercise {
        Exercise {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            duration_seconds: self.duration_seconds,
            instructions: self.instructions.clone(),
            category: self.category,
            target_muscles: self.target_muscles.clone(),
            difficulty: self.difficulty,
            image_url: None,
            video_url: None,
        }
    }
}

/// Catalog extension configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub custom: Vec<CustomExercise>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("stretchflow")
}

fn default_quick_pick_count() -> usize {
    2
}

fn default_quick_max_duration() -> u32 {
    60
}

fn default_difficulty() -> Difficulty {
    Difficulty::Beginner
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
        base.join("stretchflow").join("config.toml")
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
