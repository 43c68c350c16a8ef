//! Application-wide error types using thiserror.

use pipebot_commands::FilterError;
use pipebot_common::PipebotError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Configuration or service setup error.
    #[error("Configuration error: {0}")]
    Config(#[from] PipebotError),

    /// Filter rules could not be loaded.
    #[error("Filter store error: {0}")]
    Filters(#[from] FilterError),

    /// Discord/Serenity error.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;
