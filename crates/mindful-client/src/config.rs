use std::path::{Path, PathBuf};
use std::time::Duration;

use mindful_store::FileStorage;
use serde::Deserialize;

use crate::error::ClientError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Log every request, response and error.
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            dev_mode: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Defaults to `~/.config/mindful/storage.json`.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Drop the anonymous identity once a login succeeds.
    #[serde(default = "default_true")]
    pub clear_anon_on_login: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            clear_anon_on_login: true,
        }
    }
}

impl ClientConfig {
    pub fn from_file(path: &Path) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ClientError> {
        toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("Failed to parse config: {e}")))
    }

    /// `~/.config/mindful/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("mindful")
            .join("config.toml")
    }

    /// Load `path` if given, else the default file if it exists, else
    /// built-in defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ClientError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::from_file(&default)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `MINDFUL_API_URL` and `MINDFUL_DEV_MODE` from `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MINDFUL_API_URL").filter(|u| !u.is_empty()) {
            self.api.base_url = url;
        }
        if let Some(flag) = lookup("MINDFUL_DEV_MODE") {
            self.api.dev_mode = matches!(flag.as_str(), "1" | "true" | "yes");
        }
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(FileStorage::default_path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
