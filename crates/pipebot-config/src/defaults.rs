//! Default values for every configuration section.

use crate::schema::*;
use pipebot_common::{ChannelId, LogFormat, PlatformId, UserId};
use std::collections::HashMap;

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig::default(),
            admission: AdmissionConfig::default(),
            filters: FilterStoreConfig::default(),
            discord: DiscordConfig::default(),
            console: ConsoleConfig::default(),
            logging: LogConfig::default(),
            commands: HashMap::new(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: "$".to_string(),
            pipe_separator: "|".to_string(),
            owners: Vec::new(),
            administrators: Vec::new(),
        }
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            pending_timeout_ms: 300_000,
            prune_interval_ms: 1_000,
        }
    }
}

impl Default for FilterStoreConfig {
    fn default() -> Self {
        Self {
            database_path: "data/filters.db".to_string(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            platform_id: PlatformId(1),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            platform_id: PlatformId(0),
            channel_id: ChannelId(1),
            user_id: UserId(1),
            user_name: "console".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}
