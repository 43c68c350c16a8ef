//! Service wiring and application lifecycle.

use crate::console::ConsoleAdapter;
use crate::discord::DiscordAdapter;
use crate::error::BotResult;
use crate::handler::MessageHandler;
use pipebot_commands::{
    builtin, spawn_prune_task, CommandDispatcher, CommandRegistry, CooldownStore, FilterRegistry,
    FilterStore, MemoryFilterStore, Permissions, SledFilterStore, UserDirectory,
};
use pipebot_common::{Clock, SystemClock};
use pipebot_config::Config;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

/// Main bot structure.
pub struct PipeBot {
    config: Arc<Config>,
    handler: Arc<MessageHandler>,
    prune_task: JoinHandle<()>,
}

impl PipeBot {
    /// Builds every shared service from `config` on the system clock.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, command registration fails
    /// or the filter store cannot be opened or read.
    pub async fn new(config: Config) -> BotResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Builds every shared service from `config` on the given clock.
    ///
    /// # Errors
    ///
    /// Same as [`PipeBot::new`].
    pub async fn with_clock(config: Config, clock: Arc<dyn Clock>) -> BotResult<Self> {
        config.validate()?;

        let mut registry = CommandRegistry::new();
        builtin::register_all(&mut registry, &config)?;

        let store: Arc<dyn FilterStore> = if config.filters.is_in_memory() {
            info!("Using in-memory filter store");
            Arc::new(MemoryFilterStore::new())
        } else {
            Arc::new(SledFilterStore::new(&config.filters.database_path)?)
        };
        let filters = Arc::new(FilterRegistry::load(store, clock.clone()).await?);

        let cooldowns = Arc::new(CooldownStore::new(clock, config.admission.pending_timeout()));
        let prune_task = spawn_prune_task(cooldowns.clone(), config.admission.prune_interval());

        let dispatcher = CommandDispatcher::new(
            Arc::new(registry),
            cooldowns,
            filters,
            Arc::new(UserDirectory::new()),
            Arc::new(Permissions::new(&config.bot)),
        );
        let handler = Arc::new(MessageHandler::new(dispatcher, config.bot.prefix.clone()));

        info!(
            commands = handler.dispatcher().commands().len(),
            filters = handler.dispatcher().filters().len(),
            "Pipebot services ready"
        );

        Ok(Self {
            config: Arc::new(config),
            handler,
            prune_task,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared message handler.
    pub fn handler(&self) -> Arc<MessageHandler> {
        self.handler.clone()
    }

    /// Connects to Discord and serves messages until shut down.
    ///
    /// # Errors
    ///
    /// Fails when the configuration lacks Discord settings or the gateway
    /// client fails.
    pub async fn run_discord(&self) -> BotResult<()> {
        self.config.validate_discord()?;
        DiscordAdapter::new(self.handler(), self.config.discord.clone())
            .run()
            .await
    }

    /// Serves commands typed on standard input until EOF or Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails on terminal I/O errors.
    pub async fn run_console(&self) -> BotResult<()> {
        ConsoleAdapter::new(self.handler(), self.config.console.clone())
            .run_stdio()
            .await
    }
}

impl Drop for PipeBot {
    fn drop(&mut self) {
        self.prune_task.abort();
    }
}
