//! Discord gateway adapter built on serenity.

use crate::error::BotResult;
use crate::handler::MessageHandler;
use async_trait::async_trait;
use pipebot_common::{ChannelId, PlatformId, User};
use pipebot_config::DiscordConfig;
use serenity::all::{Client, Context, EventHandler, GatewayIntents, Message, Ready};
use std::sync::Arc;
use tracing::{info, warn};

/// Gateway intents needed to read and answer prefixed messages.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
}

/// Maps Discord messages to the message handler.
struct DiscordEvents {
    handler: Arc<MessageHandler>,
    platform: PlatformId,
}

#[async_trait]
impl EventHandler for DiscordEvents {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Connected to Discord"
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let user = User::new(msg.author.id.get(), msg.author.name.clone());
        // Direct messages have no guild and count as channel-less.
        let channel = msg.guild_id.map(|_| ChannelId(msg.channel_id.get()));

        let Some(reply) = self
            .handler
            .handle(user, channel, self.platform, &msg.content)
            .await
        else {
            return;
        };

        if let Err(e) = msg.channel_id.say(&ctx.http, reply).await {
            warn!(channel = %msg.channel_id, error = %e, "Failed to send reply");
        }
    }
}

/// Runs the bot on a Discord gateway connection.
pub struct DiscordAdapter {
    handler: Arc<MessageHandler>,
    config: DiscordConfig,
}

impl DiscordAdapter {
    /// Creates an adapter with the given handler and credentials.
    pub const fn new(handler: Arc<MessageHandler>, config: DiscordConfig) -> Self {
        Self { handler, config }
    }

    /// Connects and serves until the gateway stops or Ctrl-C is received.
    ///
    /// # Errors
    ///
    /// Fails when the client cannot be built or the gateway connection fails.
    pub async fn run(self) -> BotResult<()> {
        let events = DiscordEvents {
            handler: self.handler,
            platform: self.config.platform_id,
        };

        let mut client = Client::builder(&self.config.token, intents())
            .event_handler(events)
            .await?;
        let shard_manager = client.shard_manager.clone();

        tokio::select! {
            result = client.start() => result?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, shutting down Discord shards");
                shard_manager.shutdown_all().await;
            }
        }

        Ok(())
    }
}
