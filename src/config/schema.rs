use crate::error::{FoundryError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Runtime CLI used to start, stop and query the service
    #[serde(default = "default_program")]
    pub program: String,
    /// Attach to an already running service instead of launching one
    pub endpoint: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_api_key")]
    pub api_key: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Prefer a CPU variant over a generic GPU variant with no CUDA override
    #[serde(default = "default_cpu_fallback")]
    pub cpu_fallback: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct LoadConfig {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Environment variable holding an auth token for private models
    pub token_env: Option<String>,
}

// Default value functions
fn default_program() -> String {
    "foundry".to_string()
}
const fn default_request_timeout_secs() -> u64 {
    2 * 60 * 60
}
fn default_api_key() -> String {
    "OPENAI_API_KEY".to_string()
}
const fn default_cpu_fallback() -> bool {
    cfg!(target_os = "windows")
}
const fn default_ttl_secs() -> u64 {
    600
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            endpoint: None,
            request_timeout_secs: default_request_timeout_secs(),
            api_key: default_api_key(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cpu_fallback: default_cpu_fallback(),
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl ServiceConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl LoadConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl DownloadConfig {
    /// Read the auth token from the configured environment variable
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|token| !token.is_empty())
    }
}

impl Config {
    /// Load config from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            FoundryError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Get config path (`$XDG_CONFIG_HOME/foundry-local/config.toml`)
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config)
        } else {
            dirs::config_dir()
                .ok_or_else(|| FoundryError::Config("Cannot determine config directory".to_string()))?
        };

        Ok(config_dir.join("foundry-local").join("config.toml"))
    }
}
