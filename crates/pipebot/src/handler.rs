//! Platform-independent message handling.

use pipebot_commands::{CommandDispatcher, ExecuteOptions, Invocation, Outcome};
use pipebot_common::{tokenize, ChannelId, PlatformId, User};
use tracing::{debug, info};

/// Turns chat messages into invocations and outcomes into replies.
#[derive(Debug, Clone)]
pub struct MessageHandler {
    dispatcher: CommandDispatcher,
    prefix: String,
}

impl MessageHandler {
    /// Creates a handler answering to messages starting with `prefix`.
    pub fn new(dispatcher: CommandDispatcher, prefix: impl Into<String>) -> Self {
        Self {
            dispatcher,
            prefix: prefix.into(),
        }
    }

    /// The configured command prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The dispatcher behind this handler.
    pub const fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Splits a prefixed message into command name and arguments.
    pub fn parse(&self, text: &str) -> Option<(String, Vec<String>)> {
        let rest = text.trim_start().strip_prefix(self.prefix.as_str())?;
        let mut tokens = tokenize(rest).into_iter();
        let command = tokens.next()?;
        Some((command, tokens.collect()))
    }

    /// Handles one incoming message and returns the text to send back, if any.
    ///
    /// Every author is recorded in the user directory, whether or not the
    /// message is a command, so that later mentions of them resolve.
    pub async fn handle(
        &self,
        user: User,
        channel: Option<ChannelId>,
        platform: PlatformId,
        text: &str,
    ) -> Option<String> {
        self.dispatcher.users().observe(&user);

        let (command, args) = self.parse(text)?;
        let invocation = Invocation::new(command, args, user, channel, platform);
        let outcome = self.execute(&invocation).await;
        outcome.reply
    }

    /// Runs a prepared invocation as a direct user request.
    pub async fn execute(&self, invocation: &Invocation) -> Outcome {
        let outcome = self
            .dispatcher
            .check_and_execute(invocation, ExecuteOptions::direct())
            .await;

        if outcome.success {
            info!(
                invocation = %invocation.id,
                command = %invocation.command,
                user = %invocation.user,
                "Command completed"
            );
        } else {
            debug!(
                invocation = %invocation.id,
                command = %invocation.command,
                user = %invocation.user,
                reason = ?outcome.reason,
                "Command did not succeed"
            );
        }

        outcome
    }
}
