//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API location, where the bearer token is kept, the request timeout
//! and the last email used to sign in.
//!
//! Configuration is stored at `~/.config/leetreview/config.json`; the
//! `LEETREVIEW_*` environment variables override it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{Gateway, REQUEST_TIMEOUT_SECS};
use crate::auth::{FileTokenStore, KeyringTokenStore, TokenStore};

/// Application name used for config/data directory paths
const APP_NAME: &str = "leetreview";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// API host used when nothing is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

pub const ENV_API_URL: &str = "LEETREVIEW_API_URL";
pub const ENV_TOKEN_BACKEND: &str = "LEETREVIEW_TOKEN_BACKEND";
pub const ENV_EMAIL: &str = "LEETREVIEW_EMAIL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    #[default]
    File,
    Keyring,
}

impl fmt::Display for TokenBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenBackend::File => write!(f, "file"),
            TokenBackend::Keyring => write!(f, "keyring"),
        }
    }
}

impl FromStr for TokenBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenBackend::File),
            "keyring" | "keychain" => Ok(TokenBackend::Keyring),
            other => Err(format!("unknown token backend '{}' (expected file or keyring)", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub token_backend: TokenBackend,
    pub request_timeout_secs: u64,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_backend: TokenBackend::default(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
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

    /// Directory holding the token file and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Apply overrides from `lookup` (normally the process environment).
    /// Invalid values are reported and skipped.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut warnings = Vec::new();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_TOKEN_BACKEND) {
            match raw.parse::<TokenBackend>() {
                Ok(backend) => self.token_backend = backend,
                Err(e) => warnings.push(format!("{}: {}", ENV_TOKEN_BACKEND, e)),
            }
        }
        if let Some(email) = lookup(ENV_EMAIL).filter(|v| !v.trim().is_empty()) {
            self.last_email = Some(email.trim().to_string());
        }

        warnings
    }

    pub fn apply_env(&mut self) -> Vec<String> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Build the configured token store
    pub fn token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.token_backend {
            TokenBackend::File => Arc::new(FileTokenStore::new(self.data_dir()?)),
            TokenBackend::Keyring => Arc::new(KeyringTokenStore::new()),
        };
        Ok(store)
    }

    /// Build a gateway for the configured API with the configured store
    pub fn gateway(&self) -> Result<Gateway> {
        let store = self.token_store()?;
        Gateway::with_timeout(&self.api_base_url, self.request_timeout(), store)
            .context("Failed to create HTTP client")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.token_backend, TokenBackend::File);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"token_backend":"keyring"}"#).unwrap();
        assert_eq!(config.token_backend, TokenBackend::Keyring);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.last_email, None);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir()
            .join(format!("leetreview-config-{}", std::process::id()))
            .join(CONFIG_FILE);
        let config = Config {
            api_base_url: "https://review.example.com".to_string(),
            last_email: Some("a@b.com".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_base_url, "https://review.example.com");
        assert_eq!(loaded.last_email.as_deref(), Some("a@b.com"));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_file_is_default() {
        let path = std::env::temp_dir().join("leetreview-does-not-exist.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        let warnings = config.apply_overrides(env(&[
            (ENV_API_URL, " https://api.example.com "),
            (ENV_TOKEN_BACKEND, "Keychain"),
            (ENV_EMAIL, "me@example.com"),
        ]));
        assert!(warnings.is_empty());
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.token_backend, TokenBackend::Keyring);
        assert_eq!(config.last_email.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_invalid_backend_is_reported() {
        let mut config = Config::default();
        let warnings = config.apply_overrides(env(&[(ENV_TOKEN_BACKEND, "floppy")]));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("floppy"));
        assert_eq!(config.token_backend, TokenBackend::File);
    }
}
