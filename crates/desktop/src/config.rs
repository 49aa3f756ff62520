//! Configuration management using config.toml

use fishtracker_core::{FishTrackerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_PATH: &str = "config.toml";

const DEFAULT_API_BASE_URL: &str = "http://localhost:5555";
const DEFAULT_DESCRIPTION_URL: &str = "http://localhost:3000/api/generate-description";
const DEFAULT_DB_PATH: &str = "fishtracker.db";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the fish API (`{base}/api/fish`)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Full URL of the AI description endpoint
    #[serde(default = "default_description_url")]
    pub description_url: String,

    /// Identifier that namespaces all local collections (usually an email)
    #[serde(default)]
    pub user_id: String,

    /// SQLite file holding the local collections
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_description_url() -> String {
    DEFAULT_DESCRIPTION_URL.to_string()
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            description_url: default_description_url(),
            user_id: String::new(),
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Load config from `path`, creating a default file if it doesn't exist
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => {
                    match toml::from_str(&content) {
                        Ok(config) => return config,
                        Err(e) => {
                            tracing::warn!("Error parsing {}: {}", path.display(), e);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Error reading {}: {}", path.display(), e);
                }
            }
            // Leave a broken file alone so the user can fix it
            return Config::default();
        }

        let config = Config::default();
        if let Err(e) = config.save_to(path) {
            tracing::debug!("Could not write default config: {}", e);
        }
        config
    }

    /// Override file values with `FISHTRACKER_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields: [(&str, &mut String); 4] = [
            ("FISHTRACKER_API_URL", &mut self.api_base_url),
            ("FISHTRACKER_DESCRIPTION_URL", &mut self.description_url),
            ("FISHTRACKER_USER", &mut self.user_id),
            ("FISHTRACKER_DB", &mut self.db_path),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FishTrackerError::Config(e.to_string()))?;
        fs::write(path, content)
            .map_err(|e| FishTrackerError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Check if config has everything needed to talk to the fish API
    pub fn is_valid(&self) -> bool {
        !self.user_id.trim().is_empty() && !self.api_base_url.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config::load_from(&path);
        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert!(!config.is_valid());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "user_id = \"diver@example.com\"\n").unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.user_id, "diver@example.com");
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert!(config.is_valid());
    }

    #[test]
    fn unparsable_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "user_id = [").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), "user_id = [");
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            user_id: "u1".to_string(),
            api_base_url: "http://fish.test".to_string(),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn env_overrides_non_empty_values() {
        let env: HashMap<&str, &str> = [("FISHTRACKER_USER", "env-user"), ("FISHTRACKER_DB", "  ")].into();
        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.user_id, "env-user");
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
    }
}
