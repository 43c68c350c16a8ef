//! Invocation records and the context handed to command behaviours

use crate::cooldown::CooldownStore;
use crate::definition::CommandDefinition;
use crate::dispatcher::CommandDispatcher;
use pipebot_common::{ChannelId, PlatformId, User};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

/// One command invocation, parsed from a chat message or a pipe stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Correlation id used in logs.
    pub id: Uuid,
    /// Command name or alias as typed.
    pub command: String,
    /// Whitespace-separated arguments.
    pub args: Vec<String>,
    /// Invoking user.
    pub user: User,
    /// Channel, or `None` for a private message.
    pub channel: Option<ChannelId>,
    /// Platform the message arrived on.
    pub platform: PlatformId,
}

impl Invocation {
    /// Creates an invocation with a fresh id.
    pub fn new(
        command: impl Into<String>,
        args: Vec<String>,
        user: User,
        channel: Option<ChannelId>,
        platform: PlatformId,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            command: command.into(),
            args,
            user,
            channel,
            platform,
        }
    }

    /// Creates an invocation by the same user in the same place.
    #[must_use]
    pub fn derive(&self, command: impl Into<String>, args: Vec<String>) -> Self {
        Self::new(command, args, self.user.clone(), self.channel, self.platform)
    }

    /// The invocation as it would be typed, without prefix.
    pub fn text(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Per-call switches for [`CommandDispatcher::check_and_execute`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ExecuteOptions {
    /// Ignore and do not take the pending lock.
    pub skip_pending: bool,
    /// Never prefix the reply with the invoker's name.
    pub skip_mention: bool,
    /// Running as a pipe stage.
    pub piped: bool,
}

impl ExecuteOptions {
    /// Options for a top-level chat invocation.
    pub const fn direct() -> Self {
        Self {
            skip_pending: false,
            skip_mention: false,
            piped: false,
        }
    }

    /// Options for a pipe stage.
    pub const fn pipe_stage() -> Self {
        Self {
            skip_pending: true,
            skip_mention: true,
            piped: true,
        }
    }
}

/// What a behaviour sees while it runs.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// The invocation being executed.
    pub invocation: &'a Invocation,
    /// The resolved command.
    pub command: &'a CommandDefinition,
    /// Dispatcher running the command, for nested invocations.
    pub dispatcher: &'a CommandDispatcher,
    /// Options the command runs with.
    pub options: ExecuteOptions,
}

impl Context<'_> {
    /// The invoking user.
    pub const fn user(&self) -> &User {
        &self.invocation.user
    }
}

/// Start background task pruning expired cooldowns and pending locks
pub fn spawn_prune_task(store: Arc<CooldownStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    info!(interval = ?every, "Starting admission prune task");

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = store.prune();
            if removed > 0 {
                debug!(removed, "Prune pass complete");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipebot_common::test_utils::{chat_fixtures::*, manual_clock};
    use pipebot_common::UserId;

    #[test]
    fn test_invocation_text() {
        let args = vec!["a".into(), "b".into()];
        let invocation = Invocation::new("say", args, alice(), None, platform());
        assert_eq!(invocation.text(), "say a b");
        assert_eq!(invocation.derive("null", Vec::new()).text(), "null");
    }

    #[test]
    fn test_derive_keeps_origin_with_new_id() {
        let invocation =
            Invocation::new("pipe", Vec::new(), alice(), Some(channel_a()), platform());
        let stage = invocation.derive("say", vec!["x".into()]);

        assert_ne!(stage.id, invocation.id);
        assert_eq!(stage.user, invocation.user);
        assert_eq!(stage.channel, invocation.channel);
    }

    #[tokio::test]
    async fn test_prune_task_removes_expired_entries() {
        let clock = manual_clock();
        let store = Arc::new(CooldownStore::new(clock.clone(), Duration::from_secs(60)));
        assert!(store.set_pending(UserId(1), "say"));
        clock.advance(Duration::from_secs(61));
        assert_eq!(store.pending_count(), 1);

        let handle = spawn_prune_task(store.clone(), Duration::from_millis(5));
        for _ in 0..200 {
            if store.pending_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        handle.abort();

        assert_eq!(store.pending_count(), 0);
    }
}
