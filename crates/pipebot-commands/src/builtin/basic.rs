use crate::context::Context;
use crate::definition::{CommandBehavior, RawResult};
use crate::outcome::ReasonCode;
use async_trait::async_trait;

/// Replies with its arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct SayCommand;

#[async_trait]
impl CommandBehavior for SayCommand {
    async fn run(&self, _ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult> {
        if args.is_empty() {
            return Ok(RawResult::failure(ReasonCode::BadInvocation, "No text provided"));
        }
        Ok(RawResult::reply(args.join(" ")))
    }
}

/// Pokes another known user.
#[derive(Debug, Clone, Copy, Default)]
pub struct PokeCommand;

#[async_trait]
impl CommandBehavior for PokeCommand {
    async fn run(&self, ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult> {
        let Some(name) = args.first() else {
            return Ok(RawResult::failure(ReasonCode::BadInvocation, "Usage: poke <user>"));
        };
        let Some(target) = ctx.dispatcher.users().resolve_mention(name) else {
            return Ok(RawResult::failure(
                ReasonCode::BadInvocation,
                format!("I don't know a user called {name}"),
            ));
        };
        Ok(RawResult::reply(format!("pokes {}", target.name)))
    }
}

/// Discards its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCommand;

#[async_trait]
impl CommandBehavior for NullCommand {
    async fn run(&self, _ctx: &Context<'_>, _args: Vec<String>) -> anyhow::Result<RawResult> {
        Ok(RawResult::silent())
    }
}
