//! Reason codes and the normalized result of an invocation

use crate::definition::CooldownOverride;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Why an invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    /// The command does not exist.
    #[serde(rename = "no-command")]
    NoCommand,
    /// The user already has an invocation in flight.
    #[serde(rename = "pending")]
    Pending,
    /// A cooldown applies.
    #[serde(rename = "cooldown")]
    Cooldown,
    /// The user lacks the permission level the command requires.
    #[serde(rename = "filter")]
    Filter,
    /// The target user blocked the invoker.
    #[serde(rename = "block")]
    Block,
    /// The target user opted out of the command.
    #[serde(rename = "opt-out")]
    OptOut,
    /// NSFW output cannot be forwarded through a pipe.
    #[serde(rename = "pipe-nsfw")]
    PipeNsfw,
    /// Malformed arguments or pipe syntax.
    #[serde(rename = "bad_invocation")]
    BadInvocation,
    /// The behaviour returned an error or panicked.
    #[serde(rename = "error")]
    Error,
    /// A non-terminal pipe stage produced no output.
    #[serde(rename = "empty-pipe-result")]
    EmptyPipeResult,
}

impl ReasonCode {
    /// Every reason code, in vocabulary order.
    pub const ALL: [Self; 10] = [
        Self::NoCommand,
        Self::Pending,
        Self::Cooldown,
        Self::Filter,
        Self::Block,
        Self::OptOut,
        Self::PipeNsfw,
        Self::BadInvocation,
        Self::Error,
        Self::EmptyPipeResult,
    ];

    /// Wire name of the code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoCommand => "no-command",
            Self::Pending => "pending",
            Self::Cooldown => "cooldown",
            Self::Filter => "filter",
            Self::Block => "block",
            Self::OptOut => "opt-out",
            Self::PipeNsfw => "pipe-nsfw",
            Self::BadInvocation => "bad_invocation",
            Self::Error => "error",
            Self::EmptyPipeResult => "empty-pipe-result",
        }
    }

    /// User-facing explanation.
    pub const fn describe(self) -> &'static str {
        match self {
            Self::NoCommand => "that command does not exist",
            Self::Pending => "you already have a command in progress",
            Self::Cooldown => "that command is still on cooldown",
            Self::Filter => "you are not allowed to use that command",
            Self::Block => "the target user has blocked you from that command",
            Self::OptOut => "the target user has opted out from that command",
            Self::PipeNsfw => "NSFW output cannot be piped",
            Self::BadInvocation => "the command was invoked incorrectly",
            Self::Error => "the command failed unexpectedly",
            Self::EmptyPipeResult => "the command produced no output to pipe",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasonCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| format!("unknown reason code '{s}'"))
    }
}

/// Normalized result of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Whether the invocation succeeded.
    pub success: bool,
    /// Reply text, if any.
    pub reply: Option<String>,
    /// Failure reason; `None` on success.
    pub reason: Option<ReasonCode>,
    /// Cooldown override requested by the behaviour.
    pub cooldown_override: Option<CooldownOverride>,
}

impl Outcome {
    /// A successful outcome.
    pub fn success(reply: Option<String>) -> Self {
        Self {
            success: true,
            reply,
            reason: None,
            cooldown_override: None,
        }
    }

    /// A failed outcome with the reason's standard text as reply.
    pub fn rejected(reason: ReasonCode) -> Self {
        Self::failure(reason, reason.describe())
    }

    /// A failed outcome with a custom reply.
    pub fn failure(reason: ReasonCode, reply: impl Into<String>) -> Self {
        Self {
            success: false,
            reply: Some(reply.into()),
            reason: Some(reason),
            cooldown_override: None,
        }
    }

    /// Reply text, empty when there is none.
    pub fn reply_text(&self) -> &str {
        self.reply.as_deref().unwrap_or_default()
    }
}
