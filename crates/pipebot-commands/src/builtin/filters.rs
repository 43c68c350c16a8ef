use crate::context::Context;
use crate::definition::{CommandBehavior, CommandDefinition, RawResult};
use crate::filter::{FilterKey, FilterKind};
use crate::outcome::ReasonCode;
use anyhow::Context as _;
use async_trait::async_trait;
use pipebot_common::{ChannelId, PlatformId, Scope, UserId};
use tracing::info;

/// Creates, re-enables or disables one kind of filter rule for the invoker.
///
/// `block <user> <command|all> [channel|platform]` and
/// `<name> <command|all> [channel|platform]` for the other kinds.
#[derive(Debug, Clone, Copy)]
pub struct FilterCommand {
    kind: FilterKind,
    enable: bool,
}

impl FilterCommand {
    /// Command managing `kind` rules; `enable` selects the on or off variant.
    pub const fn new(kind: FilterKind, enable: bool) -> Self {
        Self { kind, enable }
    }

    /// Usage line for the command registered as `name`.
    pub fn usage(&self, name: &str) -> String {
        if self.kind == FilterKind::Block {
            format!("Usage: {name} <user> <command|all> [channel|platform]")
        } else {
            format!("Usage: {name} <command|all> [channel|platform]")
        }
    }

    const fn supports(self, command: &CommandDefinition) -> bool {
        match self.kind {
            FilterKind::Block => command.flags.blockable,
            FilterKind::OptOut => command.flags.opt_outable,
            FilterKind::Unmention | FilterKind::Unping => command.flags.mentionable,
        }
    }

    fn confirmation(self, subject: &str, what: &str, enabled: bool) -> String {
        match (self.kind, enabled) {
            (FilterKind::Block, true) => format!("{subject} can no longer target you with {what}."),
            (FilterKind::Block, false) => format!("{subject} can target you with {what} again."),
            (FilterKind::OptOut, true) => format!("You are now opted out from {what}."),
            (FilterKind::OptOut, false) => format!("You are no longer opted out from {what}."),
            (FilterKind::Unmention, true) => format!("You will no longer be mentioned by {what}."),
            (FilterKind::Unmention, false) => format!("You will be mentioned by {what} again."),
            (FilterKind::Unping, true) => format!("You will no longer be pinged by {what}."),
            (FilterKind::Unping, false) => format!("You will be pinged by {what} again."),
        }
    }
}

fn describe(
    command: &Scope<String>,
    channel: &Scope<ChannelId>,
    platform: &Scope<PlatformId>,
) -> String {
    let mut what = match command {
        Scope::Any => "every command".to_string(),
        Scope::Exact(name) => format!("the {name} command"),
    };
    if !channel.is_any() {
        what.push_str(" in this channel");
    } else if !platform.is_any() {
        what.push_str(" on this platform");
    }
    what
}

#[async_trait]
impl CommandBehavior for FilterCommand {
    async fn run(&self, ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult> {
        let usage = || RawResult::failure(ReasonCode::BadInvocation, self.usage(&ctx.command.name));
        let invoker = ctx.user().id;
        let mut args = args.into_iter();

        let mut subject = String::from("You");
        let mut blocked_user: Option<UserId> = None;
        if self.kind == FilterKind::Block {
            let Some(token) = args.next() else {
                return Ok(usage());
            };
            let Some(user) = ctx.dispatcher.users().resolve_mention(&token) else {
                return Ok(RawResult::failure(
                    ReasonCode::BadInvocation,
                    format!("I don't know a user called {token}"),
                ));
            };
            if user.id == invoker {
                return Ok(RawResult::failure(
                    ReasonCode::BadInvocation,
                    "You cannot block yourself",
                ));
            }
            subject = user.name;
            blocked_user = Some(user.id);
        }

        let Some(target) = args.next() else {
            return Ok(usage());
        };
        let command = if target.eq_ignore_ascii_case("all") {
            Scope::Any
        } else {
            let Some(definition) = ctx.dispatcher.commands().resolve(&target) else {
                return Ok(RawResult::failure(
                    ReasonCode::NoCommand,
                    format!("There is no command called {target}"),
                ));
            };
            if !self.supports(&definition) {
                return Ok(RawResult::failure(
                    ReasonCode::BadInvocation,
                    format!(
                        "The {} command does not support {} filters",
                        definition.name, self.kind
                    ),
                ));
            }
            Scope::Exact(definition.name.clone())
        };

        let (channel, platform) = match args.next().map(|s| s.to_lowercase()).as_deref() {
            None => (Scope::Any, Scope::Any),
            Some("channel") => match ctx.invocation.channel {
                Some(channel) => (Scope::Exact(channel), Scope::Any),
                None => {
                    return Ok(RawResult::failure(
                        ReasonCode::BadInvocation,
                        "There is no channel to limit the filter to in private messages",
                    ));
                }
            },
            Some("platform") => (Scope::Any, Scope::Exact(ctx.invocation.platform)),
            Some(_) => return Ok(usage()),
        };

        let what = describe(&command, &channel, &platform);
        let key = FilterKey {
            kind: self.kind,
            issuer: invoker,
            blocked_user,
            command,
            channel,
            platform,
        };

        let filters = ctx.dispatcher.filters();
        let existing = filters.find_match(&key);

        let rule = match (self.enable, existing) {
            (true, Some(rule)) if rule.active => {
                return Ok(RawResult::failure(
                    ReasonCode::BadInvocation,
                    "That filter is already active",
                ));
            }
            (true, Some(rule)) | (false, Some(rule)) if rule.active != self.enable => filters
                .toggle(rule.id)
                .await
                .with_context(|| format!("Failed to toggle filter rule {}", rule.id))?,
            (true, _) => filters
                .create(key)
                .await
                .context("Failed to create filter rule")?,
            (false, _) => {
                return Ok(RawResult::failure(
                    ReasonCode::BadInvocation,
                    "That filter is not active",
                ));
            }
        };

        info!(
            id = %rule.id,
            kind = %rule.key.kind,
            issuer = %invoker,
            active = rule.active,
            "Filter rule changed"
        );
        Ok(RawResult::reply(self.confirmation(&subject, &what, rule.active)))
    }
}
