//! Command definitions and the behaviour trait

use crate::context::Context;
use crate::outcome::ReasonCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default cooldown applied to commands that do not set one.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(2500);

/// Permission levels for bot commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Permission {
    /// Any user can execute this command
    #[default]
    Everyone = 0,
    /// Administrators and owners can execute this command
    Administrator = 1,
    /// Only bot owners can execute this command
    Owner = 2,
}

impl Permission {
    /// Get the permission level name as a string
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Everyone => "Everyone",
            Self::Administrator => "Administrator",
            Self::Owner => "Owner",
        }
    }
}

/// Capabilities a command opts into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CommandFlags {
    /// May appear as a non-terminal pipe stage.
    pub pipeable: bool,
    /// Must not be followed by `null` in a pipe.
    pub non_nullable: bool,
    /// Users can block others from targeting them with it.
    pub blockable: bool,
    /// Users can opt out of being targeted by it.
    pub opt_outable: bool,
    /// Replies are prefixed with the invoker's name.
    pub mentionable: bool,
}

/// How one dimension of a custom cooldown is scoped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownDimension {
    /// The invocation's own value.
    Current,
    /// Every value.
    Any,
}

/// A cooldown with explicit per-dimension scoping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooldownSpec {
    /// Cooldown length.
    pub length: Duration,
    /// Channel dimension.
    pub channel: CooldownDimension,
    /// User dimension.
    pub user: CooldownDimension,
    /// Command dimension.
    pub command: CooldownDimension,
}

/// Replaces the default cooldown a command commits after running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CooldownOverride {
    /// Commit no cooldown.
    Skip,
    /// Commit the default scope with another length.
    Length(Duration),
    /// Commit a cooldown with custom scoping.
    Custom(CooldownSpec),
}

/// What a behaviour returns before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResult {
    /// Success flag; `None` means success.
    pub success: Option<bool>,
    /// Reply text.
    pub reply: Option<String>,
    /// Failure reason.
    pub reason: Option<ReasonCode>,
    /// Cooldown override.
    pub cooldown: Option<CooldownOverride>,
}

impl RawResult {
    /// Successful result with a reply.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: Some(text.into()),
            ..Self::default()
        }
    }

    /// Successful result without a reply.
    pub fn silent() -> Self {
        Self::default()
    }

    /// Failed result with a reason and reply.
    pub fn failure(reason: ReasonCode, text: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            reply: Some(text.into()),
            reason: Some(reason),
            cooldown: None,
        }
    }

    /// Sets the cooldown override.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: CooldownOverride) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    /// Whether the result counts as a success.
    pub fn is_success(&self) -> bool {
        self.success.unwrap_or(true)
    }
}

/// The code a command runs.
#[async_trait]
pub trait CommandBehavior: Send + Sync {
    /// Runs the command with the invocation's arguments.
    async fn run(&self, ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult>;
}

/// A registered command.
#[derive(Clone)]
pub struct CommandDefinition {
    /// Canonical name.
    pub name: String,
    /// Alternative names.
    pub aliases: Vec<String>,
    /// One-line help text.
    pub description: String,
    /// Default cooldown committed after each run.
    pub cooldown: Duration,
    /// Capability flags.
    pub flags: CommandFlags,
    /// Required permission level.
    pub permission: Permission,
    /// Behaviour run when the command is admitted.
    pub behavior: Arc<dyn CommandBehavior>,
}

impl CommandDefinition {
    /// Create a command with default settings.
    pub fn new(name: impl Into<String>, behavior: impl CommandBehavior + 'static) -> Self {
        Self {
            name: name.into().to_lowercase(),
            aliases: Vec::new(),
            description: String::new(),
            cooldown: DEFAULT_COOLDOWN,
            flags: CommandFlags::default(),
            permission: Permission::Everyone,
            behavior: Arc::new(behavior),
        }
    }

    /// Set the aliases.
    #[must_use]
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_lowercase()).collect();
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the default cooldown.
    #[must_use]
    pub const fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: CommandFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the required permission.
    #[must_use]
    pub const fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = permission;
        self
    }

    /// Names this command answers to, canonical name first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("cooldown", &self.cooldown)
            .field("flags", &self.flags)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl CommandBehavior for Noop {
        async fn run(&self, _ctx: &Context<'_>, _args: Vec<String>) -> anyhow::Result<RawResult> {
            Ok(RawResult::silent())
        }
    }

    #[test]
    fn test_builder_normalizes_names() {
        let def = CommandDefinition::new("Say", Noop)
            .with_aliases(&["ECHO"])
            .with_cooldown(Duration::from_secs(1))
            .with_permission(Permission::Administrator);

        assert_eq!(def.names().collect::<Vec<_>>(), vec!["say", "echo"]);
        assert_eq!(def.cooldown, Duration::from_secs(1));
        assert_eq!(def.permission, Permission::Administrator);
    }

    #[test]
    fn test_permission_ordering() {
        assert!(Permission::Everyone < Permission::Administrator);
        assert!(Permission::Administrator < Permission::Owner);
    }

    #[test]
    fn test_raw_result_defaults_to_success() {
        assert!(RawResult::silent().is_success());
        assert!(RawResult::reply("hi").is_success());
        assert!(!RawResult::failure(ReasonCode::BadInvocation, "no").is_success());
    }
}
