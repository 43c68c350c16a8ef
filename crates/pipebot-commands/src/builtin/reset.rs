use crate::context::Context;
use crate::definition::{CommandBehavior, RawResult};
use crate::outcome::ReasonCode;
use async_trait::async_trait;
use tracing::info;

/// Clears a user's cooldowns and pending lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetCommand;

#[async_trait]
impl CommandBehavior for ResetCommand {
    async fn run(&self, ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult> {
        let Some(token) = args.first() else {
            return Ok(RawResult::failure(ReasonCode::BadInvocation, "Usage: reset <user>"));
        };
        let Some(user) = ctx.dispatcher.users().resolve_mention(token) else {
            return Ok(RawResult::failure(
                ReasonCode::BadInvocation,
                format!("I don't know a user called {token}"),
            ));
        };

        let cooldowns = ctx.dispatcher.cooldowns();
        let revoked = cooldowns.revoke_user(user.id);
        // The invoker's own lock belongs to this very invocation.
        let released = user.id != ctx.user().id && cooldowns.revoke_pending(user.id);

        info!(
            target_user = %user,
            by = %ctx.user(),
            revoked,
            released,
            "Reset user admission state"
        );

        let mut reply = format!("Cleared {revoked} cooldown(s) for {}", user.name);
        if released {
            reply.push_str(" and released their pending command");
        }
        Ok(RawResult::reply(reply))
    }
}
