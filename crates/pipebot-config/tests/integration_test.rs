//! Integration tests for pipebot-config crate.

use pipebot_common::{LogFormat, PlatformId, UserId};
use pipebot_config::{Config, ConfigError, ConfigLoader};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file
}

#[test]
fn test_full_config_round_trip_from_yaml() {
    let yaml = r#"
bot:
  prefix: "!"
  pipe_separator: ">"
  owners: [10]
  administrators: [20, 21]
admission:
  pending_timeout_ms: 60000
  prune_interval_ms: 500
filters:
  database_path: ""
console:
  platform_id: 5
  channel_id: 9
  user_id: 3
  user_name: "operator"
logging:
  level: "debug"
  format: "json"
commands:
  say:
    cooldown_ms: 2500
"#;
    let file = write_config(yaml);
    let config = ConfigLoader::parse_yaml(&std::fs::read_to_string(file.path()).unwrap()).unwrap();
    config.validate().unwrap();

    assert_eq!(config.bot.prefix, "!");
    assert_eq!(config.bot.pipe_separator, ">");
    assert_eq!(config.bot.owners, vec![UserId(10)]);
    assert_eq!(config.bot.administrators.len(), 2);
    assert_eq!(config.admission.prune_interval(), Duration::from_millis(500));
    assert!(config.filters.is_in_memory());
    assert_eq!(config.console.platform_id, PlatformId(5));
    assert_eq!(config.console.user_name, "operator");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.cooldown_override("say"), Some(Duration::from_millis(2500)));
    assert_eq!(config.cooldown_override("pipe"), None);
}

#[test]
fn test_validation_rejects_separator_equal_to_prefix() {
    let config = ConfigLoader::parse_yaml("bot:\n  prefix: \"|\"\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("Pipe separator"));
}

#[test]
fn test_load_config_reports_validation_failure() {
    let file = write_config("admission:\n  prune_interval_ms: 0\n");
    let result = ConfigLoader::load_config(file.path());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let result = ConfigLoader::load_config("/nonexistent/pipebot/config.yaml");
    assert!(matches!(result, Err(ConfigError::IoError(_))));
}

#[test]
fn test_discord_validation_requires_token() {
    let mut config = Config::default();
    assert!(config.validate_discord().is_err());

    config.discord.token = "token".to_string();
    assert!(config.validate_discord().is_ok());
}

#[test]
fn test_logging_section_converts() {
    let config = Config::default();
    let logging = config.logging.to_logging_config();
    assert_eq!(logging.level, "info");
    assert!(logging.file_path.is_none());
}
