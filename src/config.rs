use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::AppError;
use crate::models::Identity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// YouTube Data API v3 key. The YOUTUBE_API_KEY environment variable
    /// takes precedence when set.
    pub youtube_api_key: Option<String>,

    /// Account the session belongs to. Absent means guest mode, which keeps
    /// history and the skip-list in the local JSON store only.
    pub account_id: Option<String>,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mytube");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("mytube.db").to_string_lossy().to_string()
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mytube")
        .to_string_lossy()
        .to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            account_id: None,
            db_path: default_db_path(),
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
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

    pub fn save(&self) -> Result<(), AppError> {
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
            .join("mytube")
            .join("config.toml")
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var("YOUTUBE_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or_else(|| self.youtube_api_key.clone())
    }

    pub fn identity(&self) -> Identity {
        match &self.account_id {
            Some(id) if !id.is_empty() => Identity::Account(id.clone()),
            _ => Identity::Guest,
        }
    }
}
