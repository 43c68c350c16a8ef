//! Persisted user-authored filter rules

use crate::storage::FilterStore;
use parking_lot::RwLock;
use pipebot_common::{ChannelId, Clock, PipebotError, PlatformId, Scope, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// What a filter rule restricts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// The blocked user may not target the issuer with the command.
    Block,
    /// Nobody may target the issuer with the command.
    OptOut,
    /// Replies to the issuer carry no name prefix.
    Unmention,
    /// Replies to the issuer carry a name that does not notify.
    Unping,
}

impl FilterKind {
    /// Lowercase name used in logs and replies.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::OptOut => "opt-out",
            Self::Unmention => "unmention",
            Self::Unping => "unping",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage identifier of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(pub u64);

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The identity of a rule. Two rows never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterKey {
    /// Rule kind.
    pub kind: FilterKind,
    /// User who owns the rule.
    pub issuer: UserId,
    /// The user blocked from targeting the issuer; `Block` rules only.
    pub blocked_user: Option<UserId>,
    /// Command the rule applies to; `Any` is a global rule.
    pub command: Scope<String>,
    /// Channel restriction.
    pub channel: Scope<ChannelId>,
    /// Platform restriction.
    pub platform: Scope<PlatformId>,
}

impl FilterKey {
    /// A rule applying to every command everywhere.
    pub const fn global(kind: FilterKind, issuer: UserId) -> Self {
        Self {
            kind,
            issuer,
            blocked_user: None,
            command: Scope::Any,
            channel: Scope::Any,
            platform: Scope::Any,
        }
    }

    /// Restricts the rule to a command.
    #[must_use]
    pub fn for_command(mut self, command: impl Into<String>) -> Self {
        self.command = Scope::Exact(command.into());
        self
    }

    /// Sets the blocked user.
    #[must_use]
    pub const fn blocking(mut self, user: UserId) -> Self {
        self.blocked_user = Some(user);
        self
    }

    /// Restricts the rule to a channel.
    #[must_use]
    pub const fn in_channel(mut self, channel: ChannelId) -> Self {
        self.channel = Scope::Exact(channel);
        self
    }

    /// Restricts the rule to a platform.
    #[must_use]
    pub const fn on_platform(mut self, platform: PlatformId) -> Self {
        self.platform = Scope::Exact(platform);
        self
    }

    /// Checks the field combination.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Malformed`] when channel and platform are both
    /// set or `blocked_user` does not fit the kind.
    pub fn validate(&self) -> Result<(), FilterError> {
        if !self.channel.is_any() && !self.platform.is_any() {
            return Err(FilterError::Malformed(
                "a rule can be limited to a channel or a platform, not both".to_string(),
            ));
        }

        match (self.kind, self.blocked_user) {
            (FilterKind::Block, None) => Err(FilterError::Malformed(
                "a block rule needs a blocked user".to_string(),
            )),
            (FilterKind::Block, Some(_)) | (_, None) => Ok(()),
            (kind, Some(_)) => Err(FilterError::Malformed(format!(
                "a {kind} rule cannot name a blocked user"
            ))),
        }
    }
}

/// A stored filter rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Storage identifier.
    pub id: FilterId,
    /// Whether the rule applies.
    pub active: bool,
    /// Rule identity.
    pub key: FilterKey,
    /// Creation time.
    pub created_at: Timestamp,
}

impl FilterRule {
    /// Rule kind.
    pub const fn kind(&self) -> FilterKind {
        self.key.kind
    }

    /// Rule owner.
    pub const fn issuer(&self) -> UserId {
        self.key.issuer
    }
}

/// Partial update of a stored rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterPatch {
    /// New active state.
    pub active: Option<bool>,
}

impl FilterPatch {
    /// Applies the patch to a rule.
    pub fn apply(self, rule: &mut FilterRule) {
        if let Some(active) = self.active {
            rule.active = active;
        }
    }
}

/// Filter registry errors
#[derive(Error, Debug)]
pub enum FilterError {
    /// A row with the same key exists.
    #[error("Filter rule {0} already exists for this combination")]
    Duplicate(FilterId),

    /// Invalid field combination.
    #[error("Malformed filter rule: {0}")]
    Malformed(String),

    /// No rule with this identifier.
    #[error("Filter rule {0} not found")]
    NotFound(FilterId),

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] PipebotError),
}

/// In-memory view of every filter rule, kept in sync with the store.
pub struct FilterRegistry {
    store: Arc<dyn FilterStore>,
    clock: Arc<dyn Clock>,
    rules: RwLock<Vec<FilterRule>>,
    write_lock: tokio::sync::Mutex<()>,
}

impl FilterRegistry {
    /// Loads every persisted rule.
    ///
    /// # Errors
    ///
    /// Fails when the store cannot be read.
    pub async fn load(
        store: Arc<dyn FilterStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FilterError> {
        let rules = store.load_all().await?;
        info!(count = rules.len(), "Loaded filter rules");

        Ok(Self {
            store,
            clock,
            rules: RwLock::new(rules),
            write_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// The rule whose key equals `key`, active or not.
    pub fn find_match(&self, key: &FilterKey) -> Option<FilterRule> {
        self.rules.read().iter().find(|r| &r.key == key).cloned()
    }

    /// The rule with identifier `id`.
    pub fn get(&self, id: FilterId) -> Option<FilterRule> {
        self.rules.read().iter().find(|r| r.id == id).cloned()
    }

    /// Every rule issued by `issuer`.
    pub fn rules_by(&self, issuer: UserId) -> Vec<FilterRule> {
        self.rules
            .read()
            .iter()
            .filter(|r| r.key.issuer == issuer)
            .cloned()
            .collect()
    }

    /// Number of rules, inactive ones included.
    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    /// Whether no rule exists.
    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Persists a new active rule.
    ///
    /// # Errors
    ///
    /// [`FilterError::Malformed`] for invalid combinations,
    /// [`FilterError::Duplicate`] when the key is taken and
    /// [`FilterError::Storage`] when the store fails.
    pub async fn create(&self, key: FilterKey) -> Result<FilterRule, FilterError> {
        key.validate()?;

        let _write = self.write_lock.lock().await;
        if let Some(existing) = self.find_match(&key) {
            return Err(FilterError::Duplicate(existing.id));
        }

        let rule = self.store.insert(key, self.clock.now()).await?;
        debug!(
            id = %rule.id,
            kind = %rule.key.kind,
            issuer = %rule.key.issuer,
            "Created filter rule"
        );

        self.rules.write().push(rule.clone());
        Ok(rule)
    }

    /// Flips the active state of a rule.
    ///
    /// # Errors
    ///
    /// [`FilterError::NotFound`] for unknown ids and
    /// [`FilterError::Storage`] when the store fails; the in-memory copy is
    /// left unchanged on failure.
    pub async fn toggle(&self, id: FilterId) -> Result<FilterRule, FilterError> {
        let _write = self.write_lock.lock().await;
        let current = self.get(id).ok_or(FilterError::NotFound(id))?;

        let patch = FilterPatch {
            active: Some(!current.active),
        };
        let updated = self.store.update(id, patch).await?;
        debug!(%id, active = updated.active, "Toggled filter rule");

        if let Some(rule) = self.rules.write().iter_mut().find(|r| r.id == id) {
            *rule = updated.clone();
        }
        Ok(updated)
    }

    /// Finds the active rule that applies to an invocation.
    ///
    /// Lookup order, first active hit wins: the command in the channel, on
    /// the platform, everywhere; then every command in the channel, on the
    /// platform, everywhere. Channel steps are skipped without a channel.
    pub fn resolve(
        &self,
        kind: FilterKind,
        issuer: UserId,
        blocked_user: Option<UserId>,
        command: &str,
        channel: Option<ChannelId>,
        platform: PlatformId,
    ) -> Option<FilterRule> {
        let base = FilterKey {
            kind,
            issuer,
            blocked_user,
            command: Scope::Any,
            channel: Scope::Any,
            platform: Scope::Any,
        };

        let commands = [Scope::Exact(command.to_string()), Scope::Any];
        let rules = self.rules.read();

        for command in commands {
            let mut candidates = Vec::with_capacity(3);
            if let Some(channel) = channel {
                candidates.push((Scope::Exact(channel), Scope::Any));
            }
            candidates.push((Scope::Any, Scope::Exact(platform)));
            candidates.push((Scope::Any, Scope::Any));

            for (channel, platform) in candidates {
                let key = FilterKey {
                    command: command.clone(),
                    channel,
                    platform,
                    ..base.clone()
                };
                if let Some(rule) = rules.iter().find(|r| r.key == key) {
                    if rule.active {
                        return Some(rule.clone());
                    }
                }
            }
        }

        None
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("rules", &self.rules.read().len())
            .finish_non_exhaustive()
    }
}
