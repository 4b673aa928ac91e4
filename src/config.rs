use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../config/config.toml");

/// Environment variable pointing at a TOML file that replaces the embedded defaults.
pub const CONFIG_ENV_VAR: &str = "POKEDEX_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read configuration: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    pub pokemon: PokemonConfig,
    pub server: ServerConfig,
    pub colors: ColorCacheConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PokemonConfig {
    pub api_url: String,
    pub sprite_url: String,
    pub page_size: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    #[serde(default)]
    pub log_json: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ColorCacheConfig {
    pub max_entries: u32,
}

impl Config {
    /// Loads the file named by `POKEDEX_CONFIG`, or the embedded defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                tracing::info!("Loading configuration from {}", path);
                Self::from_path(path)
            }
            Err(_) => Self::from_toml(DEFAULT_CONFIG),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            tracing::error!("Failed to read {}: {}", path.as_ref().display(), e);
            ConfigError::from(e)
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents).map_err(|e| {
            tracing::error!("Failed to parse config.toml: {}", e);
            ConfigError::from(e)
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pokemon.page_size == 0 {
            return Err(ConfigError::Invalid(
                "pokemon.page_size must be greater than zero".to_string(),
            ));
        }
        if self.pokemon.api_url.is_empty() || self.pokemon.sprite_url.is_empty() {
            return Err(ConfigError::Invalid(
                "pokemon.api_url and pokemon.sprite_url must be set".to_string(),
            ));
        }
        Ok(())
    }
}
