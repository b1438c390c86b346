#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const YOUTUBE_API_KEY_VAR: &str = "YOUTUBE_API_KEY";

const DEFAULT_YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3/";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub youtube: YoutubeConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct YoutubeConfig {
    pub api_url: String,
    /// Whole-request timeout; unset waits indefinitely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_YOUTUBE_API_URL.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "nomic-embed-text:latest".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub table_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: "videos".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid timeout: {0} seconds (must be at least 1)")]
    InvalidTimeout(u64),
    #[error("Invalid table name: {0:?} (must be non-empty alphanumeric or '_')")]
    InvalidTableName(String),
    #[error("{0} is not set in the environment")]
    MissingApiKey(&'static str),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl Config {
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    /// Default home directory, `~/.yt-scraper`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".yt-scraper"))
            .or_else(|| dirs::data_dir().map(|data| data.join("yt-scraper")))
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.youtube.validate()?;
        self.ollama.validate()?;
        self.server.validate()?;
        self.store.validate()?;
        Ok(())
    }

    /// Get the path for the vector database directory
    #[inline]
    pub fn vector_database_path(&self) -> PathBuf {
        self.get_base_dir().join("vectors")
    }
}

fn request_timeout(timeout_secs: Option<u64>) -> Result<Option<Duration>, ConfigError> {
    match timeout_secs {
        Some(0) => Err(ConfigError::InvalidTimeout(0)),
        secs => Ok(secs.map(Duration::from_secs)),
    }
}

impl YoutubeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_base_url()?;
        self.timeout()?;
        Ok(())
    }

    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        request_timeout(self.timeout_secs)
    }

    /// Parsed API base. Always ends in `/` so endpoint names join underneath it.
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.api_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|_| ConfigError::InvalidUrl(self.api_url.clone()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
        }
        Ok(url)
    }
}

impl OllamaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        self.ollama_url()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        self.timeout()?;
        Ok(())
    }

    pub fn timeout(&self) -> Result<Option<Duration>, ConfigError> {
        request_timeout(self.timeout_secs)
    }

    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = !self.table_name.is_empty()
            && self
                .table_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(())
        } else {
            Err(ConfigError::InvalidTableName(self.table_name.clone()))
        }
    }
}

/// YouTube Data API credential. Never serialized, never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Read the key from `YOUTUBE_API_KEY`
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        lookup(YOUTUBE_API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .map(Self)
            .ok_or(ConfigError::MissingApiKey(YOUTUBE_API_KEY_VAR))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}
