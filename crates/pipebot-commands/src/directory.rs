//! Directory of users seen by the platform adapters

use dashmap::DashMap;
use pipebot_common::{User, UserId};
use tracing::trace;

/// Users known to the bot, by id and by lowercase name.
#[derive(Debug, Default)]
pub struct UserDirectory {
    by_id: DashMap<UserId, User>,
    by_name: DashMap<String, UserId>,
}

impl UserDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a user, replacing a previous name.
    pub fn observe(&self, user: &User) {
        let name = user.name.to_lowercase();
        if let Some(previous) = self.by_id.insert(user.id, user.clone()) {
            let old = previous.name.to_lowercase();
            if old != name {
                self.by_name.remove_if(&old, |_, id| *id == user.id);
            }
        }
        self.by_name.insert(name, user.id);
        trace!(user = %user, "Observed user");
    }

    /// User with the given id.
    pub fn get(&self, id: UserId) -> Option<User> {
        self.by_id.get(&id).map(|u| u.value().clone())
    }

    /// User with the given name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<User> {
        let id = *self.by_name.get(&name.to_lowercase())?;
        self.get(id)
    }

    /// Resolves a chat argument naming a user.
    ///
    /// Accepts `name`, `@name`, `name,` and the mention forms `<@123>` and
    /// `<@!123>`.
    pub fn resolve_mention(&self, token: &str) -> Option<User> {
        if let Some(inner) = token.strip_prefix("<@").and_then(|t| t.strip_suffix('>')) {
            let digits = inner.strip_prefix('!').unwrap_or(inner);
            return digits.parse().ok().and_then(|id| self.get(UserId(id)));
        }

        let name = token.trim_start_matches('@').trim_end_matches(',');
        if name.is_empty() {
            return None;
        }
        self.find_by_name(name)
    }

    /// Number of known users.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no user is known.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> UserDirectory {
        let directory = UserDirectory::new();
        directory.observe(&User::new(1002, "Bob"));
        directory
    }

    #[test]
    fn test_resolve_mention_forms() {
        let directory = directory();
        for token in ["bob", "BOB", "@bob", "bob,", "<@1002>", "<@!1002>"] {
            let resolved = directory.resolve_mention(token).map(|u| u.id);
            assert_eq!(resolved, Some(UserId(1002)), "{token}");
        }
        for token in ["alice", "<@999>", "<@abc>", "@", ","] {
            assert!(directory.resolve_mention(token).is_none(), "{token}");
        }
    }

    #[test]
    fn test_rename_drops_old_name() {
        let directory = directory();
        directory.observe(&User::new(1002, "robert"));

        assert!(directory.find_by_name("bob").is_none());
        assert_eq!(directory.find_by_name("Robert").unwrap().id, UserId(1002));
        assert_eq!(directory.len(), 1);
    }
}
