//! Configuration settings for Pennybook.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Journal data endpoints.
    pub data: DataConfig,
    /// Offline cache behavior.
    pub cache: CacheConfig,
    /// Network client settings.
    pub network: NetworkConfig,
}

impl Config {
    /// Load configuration from file, returning default if file doesn't exist or fails.
    pub fn load_or_default() -> crate::Result<Self> {
        Self::load(None)
    }

    /// Load configuration from file.
    pub fn load(path: Option<PathBuf>) -> crate::Result<Self> {
        let config_path = path.unwrap_or_else(|| {
            super::config_dir()
                .map(|p| p.join("config.toml"))
                .unwrap_or_else(|_| PathBuf::from("config.toml"))
        });

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content).map_err(|e| crate::Error::config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self, path: Option<PathBuf>) -> crate::Result<()> {
        let config_path = path.unwrap_or_else(|| {
            super::config_dir()
                .map(|p| p.join("config.toml"))
                .unwrap_or_else(|_| PathBuf::from("config.toml"))
        });

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::config(e.to_string()))?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }
}

/// Journal data endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Base URL the journal site is served from (origin plus scope path).
    pub base_url: String,
    /// Account configuration document, relative to the base URL.
    pub account_config_path: String,
    /// Trade index document.
    pub trades_path: String,
    /// Derived analytics payload.
    pub analytics_path: String,
    /// Notes index document.
    pub notes_index_path: String,
    /// Books index document.
    pub books_index_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/pennybook/".to_string(),
            account_config_path: "data/account-config.json".to_string(),
            trades_path: "data/trades-index.json".to_string(),
            analytics_path: "data/charts/analytics-data.json".to_string(),
            notes_index_path: "data/notes-index.json".to_string(),
            books_index_path: "data/books-index.json".to_string(),
        }
    }
}

/// Offline cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Static cache version. Bumping it on deploy replaces the whole
    /// static cache at the next activation.
    pub version: String,
    /// Core assets to bulk-cache at install time, relative to the base URL.
    pub core_assets: Vec<String>,
    /// URL substrings that mark a request as a data request.
    pub data_markers: Vec<String>,
    /// Offline fallback page served when a static asset is unreachable.
    pub offline_fallback: String,
}

impl CacheConfig {
    /// Name of the versioned static cache.
    pub fn static_cache_name(&self) -> String {
        format!("pennybook-v{}", self.version)
    }

    /// Name of the runtime cache holding the latest fetched data.
    pub fn runtime_cache_name(&self) -> &'static str {
        "pennybook-runtime"
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            core_assets: vec![
                "".to_string(),
                "index.html".to_string(),
                "manifest.json".to_string(),
                "offline.html".to_string(),
                "analytics.html".to_string(),
                "all-trades.html".to_string(),
                "assets/css/main.css".to_string(),
                "assets/js/app.js".to_string(),
                "assets/icons/icon-192.png".to_string(),
                "assets/icons/icon-512.png".to_string(),
            ],
            data_markers: vec![".json".to_string(), "/charts/".to_string()],
            offline_fallback: "offline.html".to_string(),
        }
    }
}

/// Network client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}
