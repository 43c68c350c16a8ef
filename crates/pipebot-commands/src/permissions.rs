//! Permission checks for bot commands

use crate::definition::Permission;
use pipebot_common::UserId;
use pipebot_config::BotConfig;
use std::collections::HashSet;
use tracing::debug;

/// Owner and administrator lists from configuration.
#[derive(Debug, Default, Clone)]
pub struct Permissions {
    owners: HashSet<UserId>,
    administrators: HashSet<UserId>,
}

impl Permissions {
    /// Create a new permissions manager from configuration
    pub fn new(config: &BotConfig) -> Self {
        Self {
            owners: config.owners.iter().copied().collect(),
            administrators: config.administrators.iter().copied().collect(),
        }
    }

    /// The highest level `user` holds.
    pub fn level(&self, user: UserId) -> Permission {
        if self.owners.contains(&user) {
            Permission::Owner
        } else if self.administrators.contains(&user) {
            Permission::Administrator
        } else {
            Permission::Everyone
        }
    }

    /// Check if a user has the required permission level
    pub fn check(&self, user: UserId, required: Permission) -> bool {
        let level = self.level(user);
        let allowed = level >= required;

        if allowed {
            debug!(
                %user,
                level = level.as_str(),
                required = required.as_str(),
                "Permission granted"
            );
        } else {
            debug!(%user, required = required.as_str(), "User lacks permission for command");
        }
        allowed
    }
}
