// Configuration management module
// TOML settings from the application home directory plus the API credential from the environment

pub mod settings;


pub use settings::{
    ApiKey, Config, ConfigError, OllamaConfig, ServerConfig, StoreConfig, YOUTUBE_API_KEY_VAR,
    YoutubeConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
