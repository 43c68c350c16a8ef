//! Admission checks and execution of a single invocation

use crate::context::{Context, ExecuteOptions, Invocation};
use crate::cooldown::{Admission, CooldownStore};
use crate::definition::{CommandDefinition, CooldownDimension, CooldownOverride, RawResult};
use crate::directory::UserDirectory;
use crate::filter::{FilterKind, FilterRegistry};
use crate::outcome::{Outcome, ReasonCode};
use crate::permissions::Permissions;
use crate::registry::CommandRegistry;
use futures::FutureExt;
use pipebot_common::{format_seconds, truncate_string, Scope, User};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

/// Inserted after the first character of a name so that it does not notify.
pub const UNPING_MARKER: char = '\u{E0000}';

const PENDING_DESCRIPTION_LIMIT: usize = 100;

/// Runs invocations through admission, execution and cooldown bookkeeping.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    commands: Arc<CommandRegistry>,
    cooldowns: Arc<CooldownStore>,
    filters: Arc<FilterRegistry>,
    users: Arc<UserDirectory>,
    permissions: Arc<Permissions>,
}

impl CommandDispatcher {
    /// Wires the dispatcher to its collaborators.
    pub const fn new(
        commands: Arc<CommandRegistry>,
        cooldowns: Arc<CooldownStore>,
        filters: Arc<FilterRegistry>,
        users: Arc<UserDirectory>,
        permissions: Arc<Permissions>,
    ) -> Self {
        Self {
            commands,
            cooldowns,
            filters,
            users,
            permissions,
        }
    }

    /// Registered commands.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Cooldown and pending registry.
    pub fn cooldowns(&self) -> &CooldownStore {
        &self.cooldowns
    }

    /// Filter rules.
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Known users.
    pub fn users(&self) -> &UserDirectory {
        &self.users
    }

    /// Owner and administrator lists.
    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    /// Admits, runs and post-processes one invocation.
    ///
    /// Rejections happen before anything is recorded. Once admitted, the
    /// pending lock (unless skipped) is held for exactly the duration of the
    /// behaviour, and a cooldown is committed unless the invocation runs as a
    /// pipe stage or the behaviour failed with an error.
    pub async fn check_and_execute(
        &self,
        invocation: &Invocation,
        options: ExecuteOptions,
    ) -> Outcome {
        let Some(command) = self.commands.resolve(&invocation.command) else {
            debug!(
                invocation = %invocation.id,
                command = %invocation.command,
                user = %invocation.user,
                "Rejected invocation of unknown command"
            );
            return Outcome::rejected(ReasonCode::NoCommand);
        };

        if let Some(rejection) = self.admit(invocation, &command, options) {
            debug!(
                invocation = %invocation.id,
                command = %command.name,
                user = %invocation.user,
                reason = ?rejection.reason,
                "Rejected invocation"
            );
            return rejection;
        }

        let _pending = if options.skip_pending {
            None
        } else {
            let description = truncate_string(&invocation.text(), PENDING_DESCRIPTION_LIMIT);
            match self.cooldowns.acquire_pending(invocation.user.id, description) {
                Some(guard) => Some(guard),
                None => {
                    debug!(
                        invocation = %invocation.id,
                        command = %command.name,
                        user = %invocation.user,
                        "Lost pending lock race"
                    );
                    return self.pending_rejection(invocation);
                }
            }
        };

        let ctx = Context {
            invocation,
            command: &command,
            dispatcher: self,
            options,
        };

        let result = AssertUnwindSafe(command.behavior.run(&ctx, invocation.args.clone()))
            .catch_unwind()
            .await;

        let raw = match result {
            Ok(Ok(raw)) => raw,
            Ok(Err(err)) => {
                error!(
                    invocation = %invocation.id,
                    command = %command.name,
                    user = %invocation.user,
                    error = ?err,
                    "Command failed"
                );
                return Outcome::rejected(ReasonCode::Error);
            }
            Err(panic) => {
                error!(
                    invocation = %invocation.id,
                    command = %command.name,
                    user = %invocation.user,
                    panic = panic_message(panic.as_ref()),
                    "Command panicked"
                );
                return Outcome::rejected(ReasonCode::Error);
            }
        };

        let mut outcome = normalize(raw);

        if !options.piped {
            self.commit_cooldown(invocation, &command, outcome.cooldown_override.as_ref());
        }

        if command.flags.mentionable && !options.skip_mention {
            if let Some(reply) = outcome.reply.take() {
                outcome.reply = Some(self.address(invocation, &command, reply));
            }
        }

        outcome
    }

    /// Runs the side-effect free admission steps.
    fn admit(
        &self,
        invocation: &Invocation,
        command: &CommandDefinition,
        options: ExecuteOptions,
    ) -> Option<Outcome> {
        let user = invocation.user.id;

        match self
            .cooldowns
            .check(invocation.channel, user, &command.name, options.skip_pending)
        {
            Admission::Allowed => {}
            Admission::Pending { description } => {
                return Some(Outcome::failure(
                    ReasonCode::Pending,
                    format!("You have a pending command: {description}"),
                ));
            }
            Admission::Cooldown { remaining } => {
                return Some(Outcome::failure(
                    ReasonCode::Cooldown,
                    format!(
                        "{} ({} left)",
                        ReasonCode::Cooldown.describe(),
                        format_seconds(remaining)
                    ),
                ));
            }
        }

        if !self.permissions.check(user, command.permission) {
            return Some(Outcome::rejected(ReasonCode::Filter));
        }

        if !(command.flags.blockable || command.flags.opt_outable) {
            return None;
        }

        let target = invocation
            .args
            .first()
            .and_then(|arg| self.users.resolve_mention(arg))
            .filter(|target| target.id != user)?;

        if command.flags.blockable
            && self
                .filters
                .resolve(
                    FilterKind::Block,
                    target.id,
                    Some(user),
                    &command.name,
                    invocation.channel,
                    invocation.platform,
                )
                .is_some()
        {
            return Some(Outcome::rejected(ReasonCode::Block));
        }

        if command.flags.opt_outable
            && self
                .filters
                .resolve(
                    FilterKind::OptOut,
                    target.id,
                    None,
                    &command.name,
                    invocation.channel,
                    invocation.platform,
                )
                .is_some()
        {
            return Some(Outcome::rejected(ReasonCode::OptOut));
        }

        None
    }

    fn pending_rejection(&self, invocation: &Invocation) -> Outcome {
        match self.cooldowns.fetch_pending(invocation.user.id) {
            Some(pending) => Outcome::failure(
                ReasonCode::Pending,
                format!("You have a pending command: {}", pending.description),
            ),
            None => Outcome::rejected(ReasonCode::Pending),
        }
    }

    fn commit_cooldown(
        &self,
        invocation: &Invocation,
        command: &CommandDefinition,
        cooldown: Option<&CooldownOverride>,
    ) {
        let channel = invocation.channel.map_or(Scope::Any, Scope::Exact);
        let user = Scope::Exact(invocation.user.id);
        let name = Scope::Exact(command.name.clone());

        match cooldown {
            None => self.cooldowns.set_cooldown(channel, user, name, command.cooldown),
            Some(CooldownOverride::Skip) => {}
            Some(CooldownOverride::Length(length)) => {
                self.cooldowns.set_cooldown(channel, user, name, *length);
            }
            Some(CooldownOverride::Custom(spec)) => self.cooldowns.set_cooldown(
                pick(spec.channel, channel),
                pick(spec.user, user),
                pick(spec.command, name),
                spec.length,
            ),
        }
    }

    /// Prefixes a reply with the invoker's name, honouring their filters.
    fn address(
        &self,
        invocation: &Invocation,
        command: &CommandDefinition,
        reply: String,
    ) -> String {
        let has_rule = |kind| {
            self.filters
                .resolve(
                    kind,
                    invocation.user.id,
                    None,
                    &command.name,
                    invocation.channel,
                    invocation.platform,
                )
                .is_some()
        };

        if has_rule(FilterKind::Unmention) {
            return reply;
        }

        let name = if has_rule(FilterKind::Unping) {
            unping(&invocation.user)
        } else {
            invocation.user.name.clone()
        };
        format!("{name}, {reply}")
    }
}

fn normalize(raw: RawResult) -> Outcome {
    let success = raw.is_success();
    Outcome {
        success,
        reply: raw.reply.filter(|r| !r.trim().is_empty()),
        reason: if success { None } else { raw.reason },
        cooldown_override: raw.cooldown,
    }
}

fn pick<T>(dimension: CooldownDimension, current: Scope<T>) -> Scope<T> {
    match dimension {
        CooldownDimension::Current => current,
        CooldownDimension::Any => Scope::Any,
    }
}

/// A user's name with [`UNPING_MARKER`] after the first character.
pub fn unping(user: &User) -> String {
    let mut chars = user.name.chars();
    chars.next().map_or_else(String::new, |first| {
        format!("{first}{UNPING_MARKER}{}", chars.as_str())
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
