//! Application configuration management.
//!
//! Configuration is stored at `~/.config/shelfdesk/config.json`. Environment
//! variables (optionally from a `.env` file) override the stored values for
//! the lifetime of the process; overrides are never written back.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_API_BASE;
use crate::auth::{CredentialStore, FileCredentialStore, KeyringCredentialStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "shelfdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_BASE: &str = "SHELFDESK_API_BASE";
pub const ENV_API_PATH: &str = "SHELFDESK_API_PATH";
pub const ENV_USERNAME: &str = "SHELFDESK_USERNAME";
pub const ENV_PASSWORD: &str = "SHELFDESK_PASSWORD";

/// Where the session credential is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub api_path: Option<String>,
    pub last_username: Option<String>,
    pub credential_backend: CredentialBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_path: None,
            last_username: None,
            credential_backend: CredentialBackend::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Record the last successful username in the file at `path`. Other
    /// stored values are kept as they are on disk, so environment overrides
    /// never leak into the file.
    pub fn remember_username(path: &Path, username: &str) -> Result<()> {
        let mut stored = Self::load_from(path)?;
        stored.last_username = Some(username.to_string());
        stored.save_to(path)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Apply `SHELFDESK_API_BASE`, `SHELFDESK_API_PATH` and
    /// `SHELFDESK_USERNAME` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(base) = lookup(ENV_API_BASE) {
            self.api_base = base;
        }
        if let Some(path) = lookup(ENV_API_PATH) {
            self.api_path = Some(path);
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            self.last_username = Some(username);
        }
    }

    /// The per-account API path segment, which has no usable default.
    pub fn api_path(&self) -> Result<&str> {
        self.api_path
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .with_context(|| {
                format!(
                    "No API path configured. Set {} or add \"api_path\" to {}",
                    ENV_API_PATH, CONFIG_FILE
                )
            })
    }

    /// Build the credential store selected by `credential_backend`.
    pub fn credential_store(&self) -> Result<Box<dyn CredentialStore>> {
        Ok(match self.credential_backend {
            CredentialBackend::File => Box::new(FileCredentialStore::new(&Self::cache_dir()?)),
            CredentialBackend::Keyring => Box::new(KeyringCredentialStore::new()),
        })
    }
}
