use crate::context::Context;
use crate::definition::{CommandBehavior, RawResult};
use crate::pipe::PipeExecutor;
use async_trait::async_trait;

/// Runs a pipe over its arguments.
#[derive(Debug, Clone)]
pub struct PipeCommand {
    separator: String,
}

impl PipeCommand {
    /// Creates the command with the default stage separator.
    pub const fn new(separator: String) -> Self {
        Self { separator }
    }
}

#[async_trait]
impl CommandBehavior for PipeCommand {
    async fn run(&self, ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult> {
        let outcome = PipeExecutor::new(ctx.dispatcher)
            .run(ctx.invocation, &args, &self.separator)
            .await;

        Ok(RawResult {
            success: Some(outcome.success),
            reply: outcome.reply,
            reason: outcome.reason,
            cooldown: None,
        })
    }
}
