//! Configuration loading utilities

use crate::Config;
use pipebot_common::{PipebotError, Result as PipebotResult};
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_VAR: &str = "PIPEBOT_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[source] PipebotError),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        /// Name of the offending variable.
        var: String,
        /// Underlying parse failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for PipebotError {
    fn from(err: ConfigError) -> Self {
        Self::config_with_source("Failed to load configuration", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, an override does not
    /// parse, or the result does not validate.
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::parse_yaml(&content)?;

        Self::apply_env_overrides(&mut config)?;
        config.validate().map_err(ConfigError::ValidationError)?;

        info!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from environment variables and files
    ///
    /// Looks at `PIPEBOT_CONFIG_PATH`, then `config.yaml`, then `config.yml`,
    /// and otherwise starts from the defaults.
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::load_config`].
    pub fn load() -> PipebotResult<Config> {
        let config = if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::load_config(&config_path)?
        } else if Path::new("config.yaml").exists() {
            Self::load_config("config.yaml")?
        } else if Path::new("config.yml").exists() {
            Self::load_config("config.yml")?
        } else {
            debug!("No configuration file found, using defaults");
            let mut config = Config::default();
            Self::apply_env_overrides(&mut config)?;
            config.validate().map_err(ConfigError::ValidationError)?;
            config
        };

        Ok(config)
    }

    /// Parse a YAML document; sections and fields left out take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ParseError`] on malformed YAML.
    pub fn parse_yaml(content: &str) -> Result<Config, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |var| env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvParseError`] when a numeric variable does
    /// not parse.
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            config.discord.token = token;
        }

        if let Some(prefix) = lookup("PIPEBOT_PREFIX") {
            config.bot.prefix = prefix;
        }

        if let Some(separator) = lookup("PIPEBOT_PIPE_SEPARATOR") {
            config.bot.pipe_separator = separator;
        }

        if let Some(path) = lookup("PIPEBOT_FILTER_DB") {
            config.filters.database_path = path;
        }

        if let Some(level) = lookup("PIPEBOT_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(timeout) = lookup("PIPEBOT_PENDING_TIMEOUT_MS") {
            config.admission.pending_timeout_ms =
                timeout.parse().map_err(|e| ConfigError::EnvParseError {
                    var: "PIPEBOT_PENDING_TIMEOUT_MS".to_string(),
                    source: Box::new(e),
                })?;
        }

        Ok(())
    }
}
