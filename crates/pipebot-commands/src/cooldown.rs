//! Admission registry for cooldowns and pending locks

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use pipebot_common::clock::{add_duration, remaining};
use pipebot_common::{ChannelId, Clock, Scope, Timestamp, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A timed denial of re-invocation for a (channel, user, command) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cooldown {
    /// Channel dimension; `Any` covers every channel and private messages.
    pub channel: Scope<ChannelId>,
    /// User dimension.
    pub user: Scope<UserId>,
    /// Command dimension, by canonical command name.
    pub command: Scope<String>,
    /// Instant the cooldown stops applying.
    pub expires_at: Timestamp,
}

impl Cooldown {
    fn matches(&self, channel: Option<ChannelId>, user: UserId, command: &str) -> bool {
        self.channel.matches(channel.as_ref())
            && self.user.matches(Some(&user))
            && match &self.command {
                Scope::Any => true,
                Scope::Exact(name) => name == command,
            }
    }

    fn same_scope(
        &self,
        channel: &Scope<ChannelId>,
        user: &Scope<UserId>,
        command: &Scope<String>,
    ) -> bool {
        &self.channel == channel && &self.user == user && &self.command == command
    }
}

/// An in-flight invocation lock held by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pending {
    /// Lock holder.
    pub user: UserId,
    /// Human-readable description of the running command.
    pub description: String,
    /// Safety expiry in case the holder never releases the lock.
    pub expires_at: Timestamp,
    generation: u64,
}

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// No live entry inhibits the invocation.
    Allowed,
    /// A cooldown applies for at least `remaining`.
    Cooldown {
        /// Time until the longest matching cooldown expires.
        remaining: Duration,
    },
    /// The user already has an invocation in flight.
    Pending {
        /// Description of the in-flight invocation.
        description: String,
    },
}

/// In-memory registry of live cooldowns and pending locks.
///
/// Lookups are linear scans over the live entries; expired entries are
/// ignored by every query and physically removed by [`CooldownStore::prune`].
#[derive(Debug)]
pub struct CooldownStore {
    clock: Arc<dyn Clock>,
    pending_timeout: Duration,
    cooldowns: RwLock<Vec<Cooldown>>,
    pending: DashMap<UserId, Pending>,
    generation: AtomicU64,
}

impl CooldownStore {
    /// Creates an empty store.
    pub fn new(clock: Arc<dyn Clock>, pending_timeout: Duration) -> Self {
        Self {
            clock,
            pending_timeout,
            cooldowns: RwLock::new(Vec::new()),
            pending: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Checks whether `user` may run `command` in `channel` right now.
    ///
    /// `channel` is `None` for private messages, which only match cooldowns
    /// whose channel is `Any`. With `skip_pending` the user's pending lock is
    /// ignored.
    pub fn check(
        &self,
        channel: Option<ChannelId>,
        user: UserId,
        command: &str,
        skip_pending: bool,
    ) -> Admission {
        let now = self.clock.now();

        if !skip_pending {
            if let Some(pending) = self.pending.get(&user) {
                if pending.expires_at > now {
                    return Admission::Pending {
                        description: pending.description.clone(),
                    };
                }
            }
        }

        let longest = self
            .cooldowns
            .read()
            .iter()
            .filter(|c| c.expires_at > now && c.matches(channel, user, command))
            .map(|c| c.expires_at)
            .max();

        match longest {
            Some(until) => Admission::Cooldown {
                remaining: remaining(now, until),
            },
            None => Admission::Allowed,
        }
    }

    /// Whether no live entry inhibits the invocation.
    pub fn is_allowed(
        &self,
        channel: Option<ChannelId>,
        user: UserId,
        command: &str,
        skip_pending: bool,
    ) -> bool {
        self.check(channel, user, command, skip_pending) == Admission::Allowed
    }

    /// Inserts a cooldown expiring `duration` from now. A zero duration is a no-op.
    pub fn set_cooldown(
        &self,
        channel: Scope<ChannelId>,
        user: Scope<UserId>,
        command: Scope<String>,
        duration: Duration,
    ) {
        if duration.is_zero() {
            return;
        }

        let expires_at = add_duration(self.clock.now(), duration);
        debug!(%channel, %user, %command, ?duration, "Setting cooldown");

        self.cooldowns.write().push(Cooldown {
            channel,
            user,
            command,
            expires_at,
        });
    }

    /// Takes the pending lock for `user`.
    ///
    /// Returns `false` and leaves the existing lock untouched when the user
    /// already holds a live one.
    pub fn set_pending(&self, user: UserId, description: impl Into<String>) -> bool {
        self.insert_pending(user, description.into()).is_some()
    }

    /// Takes the pending lock for `user`, returning a guard that releases it on drop.
    pub fn acquire_pending(
        &self,
        user: UserId,
        description: impl Into<String>,
    ) -> Option<PendingGuard<'_>> {
        self.insert_pending(user, description.into())
            .map(|generation| PendingGuard {
                store: self,
                user,
                generation,
            })
    }

    fn insert_pending(&self, user: UserId, description: String) -> Option<u64> {
        let now = self.clock.now();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let pending = Pending {
            user,
            description,
            expires_at: add_duration(now, self.pending_timeout),
            generation,
        };

        match self.pending.entry(user) {
            Entry::Occupied(mut entry) => {
                if entry.get().expires_at > now {
                    return None;
                }
                entry.insert(pending);
            }
            Entry::Vacant(entry) => {
                entry.insert(pending);
            }
        }

        Some(generation)
    }

    /// The live pending lock of `user`, if any.
    pub fn fetch_pending(&self, user: UserId) -> Option<Pending> {
        let now = self.clock.now();
        self.pending
            .get(&user)
            .filter(|p| p.expires_at > now)
            .map(|p| p.value().clone())
    }

    /// Drops the pending lock of `user`. Returns whether a live lock was held.
    pub fn revoke_pending(&self, user: UserId) -> bool {
        let now = self.clock.now();
        self.pending
            .remove(&user)
            .is_some_and(|(_, p)| p.expires_at > now)
    }

    /// Force-expires live cooldowns whose scope equals the given one exactly.
    pub fn revoke(
        &self,
        channel: &Scope<ChannelId>,
        user: &Scope<UserId>,
        command: &Scope<String>,
    ) -> usize {
        let now = self.clock.now();
        let mut revoked = 0;

        for cooldown in self.cooldowns.write().iter_mut() {
            if cooldown.expires_at > now && cooldown.same_scope(channel, user, command) {
                cooldown.expires_at = now;
                revoked += 1;
            }
        }

        debug!(%channel, %user, %command, revoked, "Revoked cooldowns");
        revoked
    }

    /// Force-expires every live cooldown naming `user` exactly.
    pub fn revoke_user(&self, user: UserId) -> usize {
        let now = self.clock.now();
        let mut revoked = 0;

        for cooldown in self.cooldowns.write().iter_mut() {
            if cooldown.expires_at > now && cooldown.user == Scope::Exact(user) {
                cooldown.expires_at = now;
                revoked += 1;
            }
        }

        debug!(%user, revoked, "Revoked user cooldowns");
        revoked
    }

    /// Removes every expired cooldown and pending lock.
    pub fn prune(&self) -> usize {
        let now = self.clock.now();

        let removed_cooldowns = {
            let mut cooldowns = self.cooldowns.write();
            let before = cooldowns.len();
            cooldowns.retain(|c| c.expires_at > now);
            before - cooldowns.len()
        };

        let before = self.pending.len();
        self.pending.retain(|_, p| p.expires_at > now);
        let removed_pending = before.saturating_sub(self.pending.len());

        let removed = removed_cooldowns + removed_pending;
        if removed > 0 {
            debug!(removed_cooldowns, removed_pending, "Pruned expired admission entries");
        }
        removed
    }

    /// Snapshot of the live cooldowns.
    pub fn active_cooldowns(&self) -> Vec<Cooldown> {
        let now = self.clock.now();
        self.cooldowns
            .read()
            .iter()
            .filter(|c| c.expires_at > now)
            .cloned()
            .collect()
    }

    /// Number of stored pending locks, expired ones included until pruned.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Releases a pending lock when dropped.
///
/// Only the lock this guard took is removed; a newer lock the same user
/// obtained after this one expired is left alone.
#[derive(Debug)]
pub struct PendingGuard<'a> {
    store: &'a CooldownStore,
    user: UserId,
    generation: u64,
}

impl PendingGuard<'_> {
    /// The lock holder.
    pub const fn user(&self) -> UserId {
        self.user
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let generation = self.generation;
        self.store
            .pending
            .remove_if(&self.user, |_, p| p.generation == generation);
    }
}
