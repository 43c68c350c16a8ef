//! Integration tests for the pipebot crate.
//!
//! These tests build the full service graph from configuration and drive it
//! through the message handler and the console adapter.

use pipebot::console::ConsoleAdapter;
use pipebot::discord::intents;
use pipebot::PipeBot;
use pipebot_common::test_utils::{chat_fixtures::*, init_test_logging, manual_clock};
use pipebot_common::UserId;
use pipebot_config::Config;
use serenity::all::GatewayIntents;
use std::time::Duration;
use tempfile::TempDir;
use tokio_test::assert_ok;

fn memory_config() -> Config {
    let mut config = Config::default();
    config.filters.database_path = String::new();
    config
}

#[tokio::test]
async fn test_handler_ignores_unprefixed_messages_but_records_authors() {
    init_test_logging();
    let bot = assert_ok!(PipeBot::with_clock(memory_config(), manual_clock()).await);
    let handler = bot.handler();

    assert!(handler
        .handle(alice(), Some(channel_a()), platform(), "hello there")
        .await
        .is_none());
    assert!(handler
        .handle(alice(), Some(channel_a()), platform(), "$")
        .await
        .is_none());
    assert_eq!(handler.dispatcher().users().get(alice().id), Some(alice()));
}

#[tokio::test]
async fn test_handler_runs_prefixed_commands() {
    init_test_logging();
    let bot = assert_ok!(PipeBot::with_clock(memory_config(), manual_clock()).await);
    let handler = bot.handler();

    let reply = handler
        .handle(alice(), Some(channel_a()), platform(), "  $say hello   world")
        .await;
    assert_eq!(reply.as_deref(), Some("hello world"));

    let reply = handler
        .handle(bob(), None, platform(), "$pipe say one | say two")
        .await;
    assert_eq!(reply.as_deref(), Some("bob, two one"));

    let reply = handler.handle(bob(), None, platform(), "$nothing").await;
    assert_eq!(reply.as_deref(), Some("that command does not exist"));
}

#[tokio::test]
async fn test_parse_uses_configured_prefix() {
    let mut config = memory_config();
    config.bot.prefix = "!".to_string();
    let bot = assert_ok!(PipeBot::with_clock(config, manual_clock()).await);
    let handler = bot.handler();

    assert_eq!(
        handler.parse("!say a b"),
        Some(("say".to_string(), vec!["a".to_string(), "b".to_string()]))
    );
    assert_eq!(handler.parse("$say a"), None);
    assert_eq!(handler.parse("! "), None);
}

#[tokio::test]
async fn test_console_session() {
    init_test_logging();
    let config = memory_config();
    let console = config.console.clone();
    let clock = manual_clock();
    let bot = assert_ok!(PipeBot::with_clock(config, clock.clone()).await);
    let adapter = ConsoleAdapter::new(bot.handler(), console);

    let input: &[u8] = b"say hello\n\n$echo again\nnull\n";
    let mut output = Vec::new();
    assert_ok!(adapter.run(input, &mut output).await);

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2, "{text}");
    assert_eq!(lines[0], "hello");
    assert_eq!(lines[1], "that command is still on cooldown (3 seconds left)");

    clock.advance(Duration::from_secs(3));
    assert_eq!(adapter.handle_line("say later").await.as_deref(), Some("later"));
    assert_eq!(adapter.user().id, UserId(1));
}

#[tokio::test]
async fn test_console_owner_can_reset_users() {
    let mut config = memory_config();
    config.bot.owners = vec![config.console.user_id];
    let console = config.console.clone();
    let bot = assert_ok!(PipeBot::with_clock(config, manual_clock()).await);
    let adapter = ConsoleAdapter::new(bot.handler(), console);

    bot.handler().dispatcher().users().observe(&bob());
    let reply = adapter.handle_line("reset bob").await;
    assert_eq!(reply.as_deref(), Some("console, Cleared 0 cooldown(s) for bob"));
}

#[tokio::test]
async fn test_filters_survive_restart() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let mut config = memory_config();
    config.filters.database_path = dir.path().join("filters.db").display().to_string();

    {
        let bot = assert_ok!(PipeBot::with_clock(config.clone(), manual_clock()).await);
        let reply = bot
            .handler()
            .handle(alice(), None, platform(), "$unmention all")
            .await;
        assert_eq!(
            reply.as_deref(),
            Some("You will no longer be mentioned by every command.")
        );
    }

    let bot = assert_ok!(PipeBot::with_clock(config, manual_clock()).await);
    let rules = bot.handler().dispatcher().filters().rules_by(alice().id);
    assert_eq!(rules.len(), 1);
    assert!(rules[0].active);

    let reply = bot
        .handler()
        .handle(alice(), Some(channel_a()), platform(), "$pipe say hi | say there")
        .await;
    assert_eq!(reply.as_deref(), Some("there hi"));
}

#[tokio::test]
async fn test_opt_out_applies_to_poke() {
    init_test_logging();
    let bot = assert_ok!(PipeBot::with_clock(memory_config(), manual_clock()).await);
    let handler = bot.handler();

    let reply = handler.handle(bob(), None, platform(), "$optout poke").await;
    assert_eq!(
        reply.as_deref(),
        Some("bob, You are now opted out from the poke command.")
    );

    let reply = handler
        .handle(alice(), Some(channel_a()), platform(), "$poke bob")
        .await;
    assert_eq!(
        reply.as_deref(),
        Some("the target user has opted out from that command")
    );

    let reply = handler
        .handle(bob(), Some(channel_a()), platform(), "$poke alice")
        .await;
    assert_eq!(reply.as_deref(), Some("bob, pokes alice"));
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_services_start() {
    let mut config = memory_config();
    config.admission.prune_interval_ms = 0;

    let err = PipeBot::with_clock(config, manual_clock()).await.err().unwrap();
    assert!(err.to_string().contains("Prune interval must be greater than zero"));
}

#[tokio::test]
async fn test_discord_mode_requires_token() {
    let bot = assert_ok!(PipeBot::with_clock(memory_config(), manual_clock()).await);
    assert!(bot.run_discord().await.is_err());
}

#[test]
fn test_intents_include_message_content() {
    let intents = intents();
    assert!(intents.contains(GatewayIntents::MESSAGE_CONTENT));
    assert!(intents.contains(GatewayIntents::DIRECT_MESSAGES));
    assert!(intents.contains(GatewayIntents::GUILD_MESSAGES));
}
