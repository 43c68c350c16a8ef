//! Local console platform for development.
//!
//! Every input line is sent as a message from the configured console user
//! in the configured console channel. The prefix is optional here.

use crate::error::BotResult;
use crate::handler::MessageHandler;
use pipebot_common::User;
use pipebot_config::ConsoleConfig;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// Reads commands from a line-based reader and writes replies back.
pub struct ConsoleAdapter {
    handler: Arc<MessageHandler>,
    config: ConsoleConfig,
}

impl ConsoleAdapter {
    /// Creates an adapter speaking as the configured console user.
    pub const fn new(handler: Arc<MessageHandler>, config: ConsoleConfig) -> Self {
        Self { handler, config }
    }

    /// The identity console input is attributed to.
    pub fn user(&self) -> User {
        User {
            id: self.config.user_id,
            name: self.config.user_name.clone(),
        }
    }

    /// Handles one console line, returning the reply if there is one.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let prefix = self.handler.prefix();
        let text = if line.starts_with(prefix) {
            line.to_string()
        } else {
            format!("{prefix}{line}")
        };

        self.handler
            .handle(
                self.user(),
                Some(self.config.channel_id),
                self.config.platform_id,
                &text,
            )
            .await
    }

    /// Serves until the reader reaches EOF.
    ///
    /// # Errors
    ///
    /// Fails when reading or writing fails.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> BotResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            if let Some(reply) = self.handle_line(&line).await {
                writer.write_all(reply.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Serves standard input until EOF or Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails on terminal I/O errors.
    pub async fn run_stdio(&self) -> BotResult<()> {
        info!(user = %self.user(), "Console ready, type commands and press enter");

        tokio::select! {
            result = self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()) => result,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, leaving console");
                Ok(())
            }
        }
    }
}
