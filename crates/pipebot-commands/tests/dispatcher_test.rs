//! Admission and execution through the dispatcher.

mod common;

use common::{default_config, invocation, Harness};
use pipebot_commands::{ExecuteOptions, ReasonCode};
use pipebot_common::test_utils::chat_fixtures::*;
use pipebot_common::Scope;
use pipebot_config::CommandOverride;
use std::time::Duration;
use tokio_test::assert_ok;

#[tokio::test]
async fn test_unknown_command_is_rejected_without_side_effects() {
    let h = Harness::new().await;
    let outcome = h.run_in_a(&alice(), "nope").await;

    assert!(!outcome.success);
    assert_eq!(outcome.reason, Some(ReasonCode::NoCommand));
    assert_eq!(outcome.reply_text(), "that command does not exist");
    assert!(h.dispatcher.cooldowns().fetch_pending(alice().id).is_none());
    assert!(h.dispatcher.cooldowns().active_cooldowns().is_empty());
}

#[tokio::test]
async fn test_default_cooldown_is_scoped_to_channel_user_and_command() {
    let h = Harness::new().await;

    let first = h.run_in_a(&alice(), "say hello world").await;
    assert!(first.success);
    assert_eq!(first.reply.as_deref(), Some("hello world"));

    let again = h.run_in_a(&alice(), "echo hi").await;
    assert_eq!(again.reason, Some(ReasonCode::Cooldown));
    assert!(again.reply_text().starts_with("that command is still on cooldown"));

    assert!(h.run(&alice(), Some(channel_b()), "say hi").await.success);
    assert!(h.run_in_a(&bob(), "say hi").await.success);

    h.clock.advance(Duration::from_millis(2500));
    assert!(h.run_in_a(&alice(), "say hi").await.success);
}

#[tokio::test]
async fn test_private_message_cooldown_applies_everywhere() {
    let h = Harness::new().await;
    assert!(h.run(&alice(), None, "say psst").await.success);

    assert_eq!(
        h.run_in_a(&alice(), "say hi").await.reason,
        Some(ReasonCode::Cooldown)
    );
    assert_eq!(
        h.run(&alice(), None, "say hi").await.reason,
        Some(ReasonCode::Cooldown)
    );
}

#[tokio::test]
async fn test_pending_lock_blocks_second_invocation() {
    let h = Harness::new().await;
    let dispatcher = h.dispatcher.clone();
    let slow = invocation(&alice(), Some(channel_a()), "wait");

    let handle = tokio::spawn(async move {
        dispatcher
            .check_and_execute(&slow, ExecuteOptions::direct())
            .await
    });
    h.started.notified().await;

    let blocked = h.run(&alice(), Some(channel_b()), "say hi").await;
    assert_eq!(blocked.reason, Some(ReasonCode::Pending));
    assert_eq!(blocked.reply_text(), "You have a pending command: wait");

    assert!(h.run_in_a(&bob(), "say hi").await.success);

    h.release.notify_one();
    let finished = assert_ok!(handle.await);
    assert_eq!(finished.reply.as_deref(), Some("done"));

    assert!(h.dispatcher.cooldowns().fetch_pending(alice().id).is_none());
    assert!(h.run(&alice(), Some(channel_b()), "say hi").await.success);
}

#[tokio::test]
async fn test_behaviour_error_is_reported_and_commits_nothing() {
    let h = Harness::new().await;

    let outcome = h.run_in_a(&alice(), "fail").await;
    assert_eq!(outcome.reason, Some(ReasonCode::Error));
    assert_eq!(outcome.reply_text(), "the command failed unexpectedly");

    // Neither a cooldown nor the pending lock survives the failure.
    assert_eq!(h.run_in_a(&alice(), "fail").await.reason, Some(ReasonCode::Error));
    assert!(h.dispatcher.cooldowns().fetch_pending(alice().id).is_none());
}

#[tokio::test]
async fn test_panic_is_contained() {
    let h = Harness::new().await;

    let outcome = h.run_in_a(&alice(), "explode").await;
    assert_eq!(outcome.reason, Some(ReasonCode::Error));
    assert!(h.dispatcher.cooldowns().fetch_pending(alice().id).is_none());
    assert!(h.run_in_a(&alice(), "say still alive").await.success);
}

#[tokio::test]
async fn test_permission_level_is_enforced() {
    let h = Harness::new().await;
    h.run_in_a(&bob(), "say hi").await;

    let denied = h.run_in_a(&alice(), "reset bob").await;
    assert_eq!(denied.reason, Some(ReasonCode::Filter));

    let reset = h.run_in_a(&carol(), "reset bob").await;
    assert!(reset.success);
    assert_eq!(reset.reply_text(), "carol, Cleared 1 cooldown(s) for bob");
    assert!(h.run_in_a(&bob(), "say hi").await.success);
}

#[tokio::test]
async fn test_block_rule_stops_targeting() {
    let h = Harness::new().await;

    let blocked = h.run_in_a(&bob(), "block alice hug").await;
    assert!(blocked.success, "{blocked:?}");
    assert_eq!(
        blocked.reply_text(),
        "bob, alice can no longer target you with the hug command."
    );

    assert_eq!(h.run_in_a(&alice(), "hug bob").await.reason, Some(ReasonCode::Block));
    assert_eq!(h.run_in_a(&alice(), "hug @bob").await.reason, Some(ReasonCode::Block));

    let carol_hug = h.run_in_a(&carol(), "hug bob").await;
    assert_eq!(carol_hug.reply_text(), "carol, hugs bob");

    h.advance(5);
    assert!(h.run_in_a(&bob(), "unblock alice hug").await.success);
    assert!(h.run_in_a(&alice(), "hug bob").await.success);
}

#[tokio::test]
async fn test_opt_out_applies_to_everyone_but_the_issuer() {
    let h = Harness::new().await;
    assert!(h.run(&bob(), None, "optout all").await.success);

    assert_eq!(h.run_in_a(&alice(), "hug bob").await.reason, Some(ReasonCode::OptOut));
    assert_eq!(h.run_in_a(&carol(), "hug bob").await.reason, Some(ReasonCode::OptOut));
    assert!(h.run_in_a(&alice(), "hug carol").await.success);
    assert!(h.run_in_a(&bob(), "hug bob").await.success);
}

#[tokio::test]
async fn test_unmention_and_unping_change_the_reply_prefix() {
    let h = Harness::new().await;

    assert!(h.run(&alice(), None, "unmention hug").await.success);
    assert_eq!(h.run_in_a(&alice(), "hug carol").await.reply_text(), "hugs carol");

    assert!(h.run(&bob(), None, "unping all").await.success);
    assert_eq!(
        h.run_in_a(&bob(), "hug carol").await.reply_text(),
        "b\u{E0000}ob, hugs carol"
    );
}

#[tokio::test]
async fn test_custom_cooldown_override() {
    let h = Harness::new().await;
    assert!(h.run_in_a(&alice(), "global").await.success);

    assert_eq!(
        h.run(&bob(), Some(channel_b()), "global").await.reason,
        Some(ReasonCode::Cooldown)
    );
    assert!(h.run_in_a(&bob(), "say other commands still work").await.success);

    h.advance(10);
    assert!(h.run(&bob(), Some(channel_b()), "global").await.success);
}

#[tokio::test]
async fn test_skip_cooldown_override() {
    let h = Harness::new().await;
    assert!(h.run_in_a(&alice(), "free").await.success);
    assert!(h.run_in_a(&alice(), "free").await.success);
}

#[tokio::test]
async fn test_configured_cooldown_override() {
    let mut config = default_config();
    config.commands.insert(
        "say".to_string(),
        CommandOverride {
            cooldown_ms: Some(60_000),
        },
    );
    let h = Harness::with_config(config).await;

    assert!(h.run_in_a(&alice(), "say hi").await.success);
    h.advance(30);
    assert_eq!(h.run_in_a(&alice(), "say hi").await.reason, Some(ReasonCode::Cooldown));
    h.advance(30);
    assert!(h.run_in_a(&alice(), "say hi").await.success);
}

#[tokio::test]
async fn test_revoked_cooldown_admits_again() {
    let h = Harness::new().await;
    assert!(h.run_in_a(&alice(), "say hi").await.success);

    let revoked = h.dispatcher.cooldowns().revoke(
        &Scope::Exact(channel_a()),
        &Scope::Exact(alice().id),
        &Scope::Exact("say".to_string()),
    );
    assert_eq!(revoked, 1);
    assert!(h.run_in_a(&alice(), "say hi").await.success);
}
