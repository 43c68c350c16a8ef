//! Shared harness for the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use pipebot_commands::{
    builtin, CommandBehavior, CommandDefinition, CommandDispatcher, CommandFlags, CommandRegistry,
    Context, CooldownDimension, CooldownOverride, CooldownSpec, CooldownStore, ExecuteOptions,
    FilterRegistry, Invocation, MemoryFilterStore, Outcome, Permissions, RawResult, UserDirectory,
};
use pipebot_common::test_utils::{chat_fixtures::*, init_test_logging, manual_clock};
use pipebot_common::{tokenize, ChannelId, ManualClock, User};
use pipebot_config::Config;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub dispatcher: CommandDispatcher,
    pub counter: Arc<AtomicUsize>,
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(default_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        init_test_logging();

        let clock = manual_clock();
        let counter = Arc::new(AtomicUsize::new(0));
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let mut registry = CommandRegistry::new();
        register_test_commands(&mut registry, &counter, &started, &release);
        builtin::register_all(&mut registry, &config).unwrap();

        let cooldowns = Arc::new(CooldownStore::new(
            clock.clone(),
            config.admission.pending_timeout(),
        ));
        let filters = Arc::new(
            FilterRegistry::load(Arc::new(MemoryFilterStore::new()), clock.clone())
                .await
                .unwrap(),
        );
        let users = Arc::new(UserDirectory::new());
        for user in [alice(), bob(), carol()] {
            users.observe(&user);
        }

        let dispatcher = CommandDispatcher::new(
            Arc::new(registry),
            cooldowns,
            filters,
            users,
            Arc::new(Permissions::new(&config.bot)),
        );

        Self {
            clock,
            dispatcher,
            counter,
            started,
            release,
        }
    }

    pub async fn run(&self, user: &User, channel: Option<ChannelId>, text: &str) -> Outcome {
        let invocation = invocation(user, channel, text);
        self.dispatcher
            .check_and_execute(&invocation, ExecuteOptions::direct())
            .await
    }

    pub async fn run_in_a(&self, user: &User, text: &str) -> Outcome {
        self.run(user, Some(channel_a()), text).await
    }

    pub fn advance(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }

    pub fn count(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

pub fn default_config() -> Config {
    let mut config = Config::default();
    config.bot.administrators = vec![carol().id];
    config
}

pub fn invocation(user: &User, channel: Option<ChannelId>, text: &str) -> Invocation {
    let mut tokens = tokenize(text).into_iter();
    let command = tokens.next().unwrap_or_default();
    Invocation::new(command, tokens.collect(), user.clone(), channel, platform())
}

fn register_test_commands(
    registry: &mut CommandRegistry,
    counter: &Arc<AtomicUsize>,
    started: &Arc<Notify>,
    release: &Arc<Notify>,
) {
    registry
        .register(
            CommandDefinition::new("hug", Hug).with_flags(CommandFlags {
                blockable: true,
                opt_outable: true,
                mentionable: true,
                ..CommandFlags::default()
            }),
        )
        .unwrap();
    registry
        .register(CommandDefinition::new("fail", Fail).with_cooldown(Duration::from_secs(30)))
        .unwrap();
    registry
        .register(CommandDefinition::new("explode", Explode).with_cooldown(Duration::from_secs(30)))
        .unwrap();
    registry
        .register(
            CommandDefinition::new("count", Count(counter.clone())).with_flags(CommandFlags {
                pipeable: true,
                ..CommandFlags::default()
            }),
        )
        .unwrap();
    registry
        .register(
            CommandDefinition::new("keep", Keep).with_flags(CommandFlags {
                pipeable: true,
                non_nullable: true,
                ..CommandFlags::default()
            }),
        )
        .unwrap();
    registry
        .register(
            CommandDefinition::new("argc", ArgCount).with_flags(CommandFlags {
                pipeable: true,
                ..CommandFlags::default()
            }),
        )
        .unwrap();
    registry
        .register(CommandDefinition::new(
            "wait",
            Wait {
                started: started.clone(),
                release: release.clone(),
            },
        ))
        .unwrap();
    registry
        .register(CommandDefinition::new("global", GlobalCooldown))
        .unwrap();
    registry
        .register(CommandDefinition::new("free", Free))
        .unwrap();
}

struct Hug;

#[async_trait]
impl CommandBehavior for Hug {
    async fn run(&self, _ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult> {
        Ok(RawResult::reply(format!("hugs {}", args.join(" "))))
    }
}

struct Fail;

#[async_trait]
impl CommandBehavior for Fail {
    async fn run(&self, _ctx: &Context<'_>, _args: Vec<String>) -> anyhow::Result<RawResult> {
        anyhow::bail!("upstream API returned 503")
    }
}

struct Explode;

#[async_trait]
impl CommandBehavior for Explode {
    async fn run(&self, _ctx: &Context<'_>, _args: Vec<String>) -> anyhow::Result<RawResult> {
        panic!("kaboom")
    }
}

struct Count(Arc<AtomicUsize>);

#[async_trait]
impl CommandBehavior for Count {
    async fn run(&self, _ctx: &Context<'_>, _args: Vec<String>) -> anyhow::Result<RawResult> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(RawResult::reply("counted"))
    }
}

struct Keep;

#[async_trait]
impl CommandBehavior for Keep {
    async fn run(&self, _ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult> {
        Ok(RawResult::reply(args.join(" ")))
    }
}

struct ArgCount;

#[async_trait]
impl CommandBehavior for ArgCount {
    async fn run(&self, _ctx: &Context<'_>, args: Vec<String>) -> anyhow::Result<RawResult> {
        Ok(RawResult::reply(args.len().to_string()))
    }
}

struct Wait {
    started: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl CommandBehavior for Wait {
    async fn run(&self, _ctx: &Context<'_>, _args: Vec<String>) -> anyhow::Result<RawResult> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(RawResult::reply("done"))
    }
}

struct GlobalCooldown;

#[async_trait]
impl CommandBehavior for GlobalCooldown {
    async fn run(&self, _ctx: &Context<'_>, _args: Vec<String>) -> anyhow::Result<RawResult> {
        Ok(RawResult::reply("ok").with_cooldown(CooldownOverride::Custom(CooldownSpec {
            length: Duration::from_secs(10),
            channel: CooldownDimension::Any,
            user: CooldownDimension::Any,
            command: CooldownDimension::Current,
        })))
    }
}

struct Free;

#[async_trait]
impl CommandBehavior for Free {
    async fn run(&self, _ctx: &Context<'_>, _args: Vec<String>) -> anyhow::Result<RawResult> {
        Ok(RawResult::reply("free").with_cooldown(CooldownOverride::Skip))
    }
}
