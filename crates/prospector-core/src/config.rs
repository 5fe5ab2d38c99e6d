//! Application configuration management.
//!
//! This module handles loading the client configuration: the
//! backend address, request timeout and circuit-breaker tuning.
//!
//! Configuration is stored at `~/.config/prospector/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::auth::AuthConfig;

/// Application name used for config directory paths
const APP_NAME: &str = "prospector";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable that overrides `base_url`
pub const BASE_URL_ENV: &str = "PROSPECTOR_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load from the user config directory, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Self = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            config
                .auth
                .validate()
                .with_context(|| format!("Invalid auth settings in {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides on top of the loaded file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.base_url = url.trim().to_string();
            }
        }
        self
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("prospector-config-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(&temp_path("does-not-exist.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.auth.max_failures, 2);
    }

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = temp_path(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn assert_rejected(name: &str, contents: &str) {
        let path = write_config(name, contents);
        let err = Config::load_from(&path).unwrap_err();
        assert!(
            err.to_string().contains("Invalid auth settings"),
            "unexpected error for {contents}: {err:#}"
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_full_file_loads() {
        let path = write_config(
            "full.json",
            r#"{"base_url": "https://prospects.example.com", "request_timeout_secs": 10,
                "auth": {"max_failures": 3, "reset_window_secs": 120,
                         "protected_routes": ["/dashboard"], "stale_after_secs": 60}}"#,
        );
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url, "https://prospects.example.com");
        assert_eq!(loaded.auth.max_failures, 3);
        assert_eq!(loaded.auth.protected_routes, vec!["/dashboard"]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_zero_max_failures_rejected() {
        assert_rejected("zero-failures.json", r#"{"auth": {"max_failures": 0}}"#);
    }

    #[test]
    fn test_negative_reset_window_rejected() {
        assert_rejected("negative-window.json", r#"{"auth": {"reset_window_secs": -1}}"#);
    }

    #[test]
    fn test_out_of_range_reset_window_rejected() {
        assert_rejected(
            "huge-window.json",
            r#"{"auth": {"reset_window_secs": 9223372036854775807}}"#,
        );
    }

    #[test]
    fn test_negative_stale_after_rejected() {
        assert_rejected("negative-stale.json", r#"{"auth": {"stale_after_secs": -30}}"#);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"request_timeout_secs": 5}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.request_timeout_secs, 5);
        assert_eq!(loaded.base_url, "http://localhost:5000");
        assert_eq!(loaded.auth, AuthConfig::default());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let path = temp_path("invalid.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
        let _ = std::fs::remove_file(&path);
    }
}
