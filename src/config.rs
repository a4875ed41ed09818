use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

const APP_DIR: &str = "catfeina";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Writable copy of the content database.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Packaged database copied to `db_path` on first start.
    pub asset_db_path: Option<String>,

    #[serde(default = "default_preferences_path")]
    pub preferences_path: String,

    #[serde(default = "default_image_dir")]
    pub image_dir: String,
}

fn data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir
}

fn default_db_path() -> String {
    data_dir().join("catfeina.db").to_string_lossy().to_string()
}

fn default_preferences_path() -> String {
    data_dir()
        .join("catfeina_settings.toml")
        .to_string_lossy()
        .to_string()
}

fn default_image_dir() -> String {
    data_dir().join("images").to_string_lossy().to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            asset_db_path: None,
            preferences_path: default_preferences_path(),
            image_dir: default_image_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }
}
