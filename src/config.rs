//! Application configuration management.
//!
//! Configuration is stored at `~/.config/mealbridge/config.json`; the API
//! base URL can also be overridden with the `MEALBRIDGE_API_URL` environment
//! variable. `Config::load` pulls in a `.env` file first, so overrides can
//! live next to the working directory during development.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "mealbridge";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default API base URL for local development.
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/";

/// Environment variable overriding the API base URL.
const API_URL_ENV: &str = "MEALBRIDGE_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api_base_url: String,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            last_username: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_env();
        Self::load_from(&Self::config_path()?)
    }

    /// Load a `.env` file into the environment if one is present. Called by
    /// `load`; a missing file is fine.
    pub fn load_env() {
        let _ = dotenvy::dotenv();
    }

    /// Load from an explicit config file path, then apply the environment
    /// override. Absent file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api_base_url = url;
        }

        // The pipeline joins paths by concatenation; normalize once here.
        if !config.api_base_url.ends_with('/') {
            config.api_base_url.push('/');
        }

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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_points_at_local_api() {
        let config = Config::default();
        assert_eq!(config.api_base_url, "http://localhost:8000/api/");
        assert!(config.last_username.is_none());
    }

    #[test]
    #[serial]
    fn missing_file_falls_back_to_defaults() {
        std::env::remove_var(API_URL_ENV);
        let dir = tempfile::tempdir().unwrap();

        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    #[serial]
    fn config_file_is_read_and_base_url_normalized() {
        std::env::remove_var(API_URL_ENV);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{"api_base_url": "https://api.mealbridge.example/v1", "last_username": "dana"}"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();

        // Trailing slash added so path concatenation works.
        assert_eq!(config.api_base_url, "https://api.mealbridge.example/v1/");
        assert_eq!(config.last_username.as_deref(), Some("dana"));
    }

    #[test]
    #[serial]
    fn env_var_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"api_base_url": "https://stale.example/api/", "last_username": null}"#)
            .unwrap();

        std::env::set_var(API_URL_ENV, "https://override.example/api");
        let config = Config::load_from(&path).unwrap();
        std::env::remove_var(API_URL_ENV);

        assert_eq!(config.api_base_url, "https://override.example/api/");
    }

    #[test]
    #[serial]
    fn dotenv_file_feeds_the_override() {
        std::env::remove_var(API_URL_ENV);
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            format!("{API_URL_ENV}=https://dotenv.example/api/"),
        )
        .unwrap();

        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        Config::load_env();
        std::env::set_current_dir(previous).unwrap();

        let config = Config::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        std::env::remove_var(API_URL_ENV);

        assert_eq!(config.api_base_url, "https://dotenv.example/api/");
    }
}
