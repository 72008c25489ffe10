use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::AdhkarError;
use crate::geo::DEFAULT_GEO_API;
use crate::prayer_times::client::DEFAULT_PRAYER_API;

pub const API_KEY_VAR: &str = "API_KEY";

fn default_port() -> u16 {
    3000
}
fn default_geo_base_url() -> String {
    DEFAULT_GEO_API.to_string()
}
fn default_prayer_base_url() -> String {
    DEFAULT_PRAYER_API.to_string()
}
fn default_proxy_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Upstream country/state/city API the proxy forwards to.
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,
    #[serde(default = "default_prayer_base_url")]
    pub prayer_base_url: String,
    /// Where the `geo` commands find a running proxy.
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            geo_base_url: default_geo_base_url(),
            prayer_base_url: default_prayer_base_url(),
            proxy_url: default_proxy_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "vsadhkar")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("vsadhkar.db"))
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        Ok(config)
    }

    /// Load `config.toml`, writing the defaults out first if it is missing so
    /// there is a file to edit.
    pub fn load_or_init() -> Result<Self> {
        Self::load_or_init_at(&Self::config_path()?)
    }

    pub fn load_or_init_at(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        if let Err(e) = config.save_to(path) {
            warn!("Could not write default config: {:#}", e);
        }
        Ok(config)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Read the upstream geo API key. A blank value counts as missing.
pub fn api_key_from_env() -> Result<String, AdhkarError> {
    std::env::var(API_KEY_VAR)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .ok_or(AdhkarError::MissingApiKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.api.prayer_base_url, DEFAULT_PRAYER_API);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.api.proxy_url, "http://localhost:3000");
    }

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vsadhkar").join("config.toml");
        let config = AppConfig::load_or_init_at(&path).unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(path.exists());

        std::fs::write(&path, "[server]\nport = 4000\n").unwrap();
        assert_eq!(AppConfig::load_or_init_at(&path).unwrap().server.port, 4000);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.api.proxy_url = "https://geo.example.org".into();
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.api.proxy_url, "https://geo.example.org");
    }
}
