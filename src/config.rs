//! Configuration management for flixtui
//!
//! Handles config file loading and API key resolution.
//! Config is stored at ~/.config/flixtui/config.toml:
//!
//! ```toml
//! tmdb_api_key = "..."
//! firebase_api_key = "..."
//! firebase_project_id = "netflix-clone"
//! data_dir = "/home/me/.local/share/flixtui"
//! list_poll_interval_secs = 5
//! log_level = "info"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_POLL_SECS: u64 = 5;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TMDB v3 API key
    pub tmdb_api_key: Option<String>,
    /// Firebase web API key (identity provider)
    pub firebase_api_key: Option<String>,
    /// Firebase project holding the user documents
    pub firebase_project_id: Option<String>,
    /// Where the store snapshot, session and log live
    pub data_dir: Option<PathBuf>,
    /// Refresh interval for lists on stores without push
    pub list_poll_interval_secs: Option<u64>,
    /// Fallback log filter when RUST_LOG is unset
    pub log_level: Option<String>,
}

impl Config {
    /// Get config file path (~/.config/flixtui/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("flixtui").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found.
    /// Environment variables override the file.
    pub fn load() -> Self {
        let mut config = Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default();
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Override keys from `TMDB_API_KEY`, `FIREBASE_API_KEY` and
    /// `FIREBASE_PROJECT_ID`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("TMDB_API_KEY") {
            self.tmdb_api_key = Some(key);
        }
        if let Some(key) = non_empty("FIREBASE_API_KEY") {
            self.firebase_api_key = Some(key);
        }
        if let Some(project) = non_empty("FIREBASE_PROJECT_ID") {
            self.firebase_project_id = Some(project);
        }
    }

    /// Data directory (~/.local/share/flixtui unless configured)
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|p| p.join("flixtui")))
            .unwrap_or_else(|| PathBuf::from(".flixtui"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.list_poll_interval_secs
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_POLL_SECS),
        )
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Both Firebase settings are present
    pub fn has_firebase(&self) -> bool {
        self.firebase_api_key.is_some() && self.firebase_project_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.tmdb_api_key.is_none());
        assert!(!config.has_firebase());
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config {
            tmdb_api_key: Some("from-file".into()),
            ..Config::default()
        };
        config.apply_env(|name| match name {
            "TMDB_API_KEY" => Some("from-env".into()),
            "FIREBASE_PROJECT_ID" => Some("netflix-clone".into()),
            "FIREBASE_API_KEY" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.tmdb_api_key.as_deref(), Some("from-env"));
        assert_eq!(config.firebase_project_id.as_deref(), Some("netflix-clone"));
        // blank values are ignored
        assert!(config.firebase_api_key.is_none());
    }

    #[test]
    fn test_written_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            firebase_api_key: Some("key".into()),
            firebase_project_id: Some("proj".into()),
            list_poll_interval_secs: Some(0),
            ..Config::default()
        };
        std::fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.has_firebase());
        // zero falls back to the default interval
        assert_eq!(loaded.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.log_level(), "debug");
        assert!(loaded.data_dir.is_none());
    }
}
