//! Configuration schema definitions.

use pipebot_common::{ChannelId, LogFormat, LoggingConfig, PipebotError, PlatformId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Main configuration structure for Pipebot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Command parsing and permission configuration.
    pub bot: BotConfig,
    /// Cooldown and pending-lock configuration.
    pub admission: AdmissionConfig,
    /// Filter rule storage configuration.
    pub filters: FilterStoreConfig,
    /// Discord configuration.
    pub discord: DiscordConfig,
    /// Local console platform configuration.
    pub console: ConsoleConfig,
    /// Logging configuration.
    pub logging: LogConfig,
    /// Per-command overrides keyed by command name.
    pub commands: HashMap<String, CommandOverride>,
}

/// Command parsing and permission configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Prefix that marks a chat message as a command invocation.
    pub prefix: String,
    /// Default separator between pipe stages.
    pub pipe_separator: String,
    /// Bot owners.
    pub owners: Vec<UserId>,
    /// Bot administrators.
    pub administrators: Vec<UserId>,
}

/// Cooldown and pending-lock configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Safety expiry for a pending lock, in milliseconds.
    pub pending_timeout_ms: u64,
    /// Interval between prune passes over expired entries, in milliseconds.
    pub prune_interval_ms: u64,
}

impl AdmissionConfig {
    /// Pending lock safety expiry.
    pub const fn pending_timeout(&self) -> Duration {
        Duration::from_millis(self.pending_timeout_ms)
    }

    /// Prune task interval.
    pub const fn prune_interval(&self) -> Duration {
        Duration::from_millis(self.prune_interval_ms)
    }
}

/// Filter rule storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterStoreConfig {
    /// Path of the sled database; empty selects the in-memory store.
    pub database_path: String,
}

impl FilterStoreConfig {
    /// Whether filters are kept in memory only.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.trim().is_empty()
    }
}

/// Discord bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord bot token.
    pub token: String,
    /// Platform ID assigned to Discord invocations.
    pub platform_id: PlatformId,
}

/// Local console platform configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Platform ID assigned to console invocations.
    pub platform_id: PlatformId,
    /// Channel the console speaks in.
    pub channel_id: ChannelId,
    /// ID of the console user.
    pub user_id: UserId,
    /// Name of the console user.
    pub user_name: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `pipebot_commands=debug`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Optional file to append logs to instead of stdout.
    pub file: Option<String>,
}

impl LogConfig {
    /// Converts into the logging initializer's configuration.
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.level.clone(),
            format: self.format,
            file_path: self.file.clone(),
            ..LoggingConfig::default()
        }
    }
}

/// Per-command override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandOverride {
    /// Replaces the command's default cooldown, in milliseconds.
    pub cooldown_ms: Option<u64>,
}

impl Config {
    /// Validates settings shared by every platform.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field.
    pub fn validate(&self) -> Result<(), PipebotError> {
        if self.bot.prefix.trim().is_empty() {
            return Err(PipebotError::validation_field(
                "Command prefix cannot be empty",
                "bot.prefix",
            ));
        }

        if self.bot.pipe_separator.trim().is_empty() {
            return Err(PipebotError::validation_field(
                "Pipe separator cannot be empty",
                "bot.pipe_separator",
            ));
        }

        if self.bot.pipe_separator == self.bot.prefix {
            return Err(PipebotError::validation_field(
                "Pipe separator must differ from the command prefix",
                "bot.pipe_separator",
            ));
        }

        if self.admission.pending_timeout_ms == 0 {
            return Err(PipebotError::validation_field(
                "Pending timeout must be greater than zero",
                "admission.pending_timeout_ms",
            ));
        }

        if self.admission.prune_interval_ms == 0 {
            return Err(PipebotError::validation_field(
                "Prune interval must be greater than zero",
                "admission.prune_interval_ms",
            ));
        }

        if self.console.platform_id == self.discord.platform_id {
            return Err(PipebotError::validation_field(
                "Console and Discord platforms need distinct IDs",
                "console.platform_id",
            ));
        }

        Ok(())
    }

    /// Validates settings required to connect to Discord.
    ///
    /// # Errors
    ///
    /// Fails when shared validation fails or the token is missing.
    pub fn validate_discord(&self) -> Result<(), PipebotError> {
        self.validate()?;

        if self.discord.token.trim().is_empty() {
            return Err(PipebotError::validation_field(
                "Discord token cannot be empty",
                "discord.token",
            ));
        }

        Ok(())
    }

    /// Cooldown override configured for `command`, if any.
    pub fn cooldown_override(&self, command: &str) -> Option<Duration> {
        self.commands
            .get(command)
            .and_then(|o| o.cooldown_ms)
            .map(Duration::from_millis)
    }
}
