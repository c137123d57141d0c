use crate::constants::{USER_AGENT, limits, providers};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

pub const ENV_REMOTE_USERNAME: &str = "MARQUEE_REMOTE_USERNAME";
pub const ENV_REMOTE_PASSWORD: &str = "MARQUEE_REMOTE_PASSWORD";
pub const ENV_TMDB_API_KEY: &str = "MARQUEE_TMDB_API_KEY";
pub const ENV_OMDB_API_KEY: &str = "MARQUEE_OMDB_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub remote: RemoteConfig,

    pub sync: SyncConfig,

    pub metadata: MetadataConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "pretty" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/marquee.db".to_string(),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
        }
    }
}

/// Connection to the WordPress REST root, e.g. `https://example.org/wp-json/wp/v2`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,

    pub username: String,

    /// WordPress application password, not the account password.
    pub application_password: String,

    pub request_timeout_seconds: u64,

    pub user_agent: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("application_password", &"<redacted>")
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/wp-json/wp/v2".to_string(),
            username: String::new(),
            application_password: String::new(),
            request_timeout_seconds: 30,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Items requested per listing page in bulk runs.
    pub page_size: u32,

    /// Check that the CMS filled in inverse relationship fields after a
    /// bidirectional sync.
    pub verify_inverse_relationships: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: limits::DEFAULT_PAGE_SIZE,
            verify_inverse_relationships: false,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub tmdb_base_url: String,

    pub tmdb_api_key: Option<String>,

    pub omdb_base_url: String,

    pub omdb_api_key: Option<String>,

    pub request_timeout_seconds: u64,
}

impl std::fmt::Debug for MetadataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |key: &Option<String>| key.as_ref().map(|_| "<redacted>");
        f.debug_struct("MetadataConfig")
            .field("tmdb_base_url", &self.tmdb_base_url)
            .field("tmdb_api_key", &redact(&self.tmdb_api_key))
            .field("omdb_base_url", &self.omdb_base_url)
            .field("omdb_api_key", &redact(&self.omdb_api_key))
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            tmdb_base_url: providers::TMDB_API.to_string(),
            tmdb_api_key: None,
            omdb_base_url: providers::OMDB_API.to_string(),
            omdb_api_key: None,
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6790,
            cors_allowed_origins: vec![
                "http://localhost:6790".to_string(),
                "http://127.0.0.1:6790".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = paths
            .iter()
            .find(|path| path.exists())
            .map_or_else(
                || {
                    info!("No config file found, using defaults");
                    Ok(Self::default())
                },
                |path| {
                    info!("Loading config from: {}", path.display());
                    Self::load_from_path(path)
                },
            )?;

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Credentials from the environment win over the file.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(username) = var(ENV_REMOTE_USERNAME) {
            self.remote.username = username;
        }
        if let Some(password) = var(ENV_REMOTE_PASSWORD) {
            self.remote.application_password = password;
        }
        if let Some(key) = var(ENV_TMDB_API_KEY) {
            self.metadata.tmdb_api_key = Some(key);
        }
        if let Some(key) = var(ENV_OMDB_API_KEY) {
            self.metadata.omdb_api_key = Some(key);
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("marquee").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".marquee").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.remote.base_url)
            .with_context(|| format!("Invalid remote.base_url: '{}'", self.remote.base_url))?;
        Url::parse(&self.metadata.tmdb_base_url).with_context(|| {
            format!("Invalid metadata.tmdb_base_url: '{}'", self.metadata.tmdb_base_url)
        })?;
        Url::parse(&self.metadata.omdb_base_url).with_context(|| {
            format!("Invalid metadata.omdb_base_url: '{}'", self.metadata.omdb_base_url)
        })?;

        if self.sync.page_size == 0 || self.sync.page_size > limits::MAX_PAGE_SIZE {
            anyhow::bail!(
                "sync.page_size must be between 1 and {}",
                limits::MAX_PAGE_SIZE
            );
        }

        if !matches!(self.general.log_format.as_str(), "pretty" | "json") {
            anyhow::bail!("general.log_format must be \"pretty\" or \"json\"");
        }

        Ok(())
    }
}
