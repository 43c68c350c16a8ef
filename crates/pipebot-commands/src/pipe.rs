//! Chained execution of invocations
//!
//! A pipe is a list of stages separated by a delimiter, e.g.
//! `say hello | say world`. Each stage is a full invocation admitted by the
//! [`CommandDispatcher`]; its reply is appended to the arguments of the next
//! stage. The chain stops at the first failing stage.

use crate::context::{ExecuteOptions, Invocation};
use crate::definition::CommandDefinition;
use crate::dispatcher::CommandDispatcher;
use crate::outcome::{Outcome, ReasonCode};
use pipebot_common::tokenize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Name of the no-op command that discards its input.
pub const NULL_COMMAND: &str = "null";

const PASTE_OPTION: &str = "_paste";
const SEPARATOR_OPTION: &str = "_char:";

/// Pipe syntax errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipeError {
    /// Nothing to run.
    #[error("no commands were given to pipe")]
    Empty,

    /// A stage between two separators is blank.
    #[error("stage {0} of the pipe is empty")]
    EmptyStage(usize),

    /// A leading `_` option is not recognized.
    #[error("unknown pipe option '{0}'")]
    UnknownOption(String),
}

/// One parsed stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeStage {
    /// Command name or alias.
    pub command: String,
    /// The stage's own arguments.
    pub args: Vec<String>,
}

/// A parsed pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipePlan {
    /// Forward each reply as a single argument.
    pub paste: bool,
    /// Stages in execution order.
    pub stages: Vec<PipeStage>,
}

impl PipePlan {
    /// Parses pipe arguments.
    ///
    /// Leading options: `_paste` forwards each reply as one argument and
    /// `_char:<sep>` replaces `separator` for this call.
    ///
    /// # Errors
    ///
    /// Fails on unknown options, blank stages and empty input.
    pub fn parse(args: &[String], separator: &str) -> Result<Self, PipeError> {
        let mut paste = false;
        let mut separator = separator.to_string();
        let mut rest = args;

        while let Some((first, tail)) = rest.split_first() {
            if !first.starts_with('_') {
                break;
            }
            if first == PASTE_OPTION {
                paste = true;
            } else if let Some(custom) = first
                .strip_prefix(SEPARATOR_OPTION)
                .filter(|s| !s.is_empty())
            {
                separator = custom.to_string();
            } else {
                return Err(PipeError::UnknownOption(first.clone()));
            }
            rest = tail;
        }

        if rest.is_empty() {
            return Err(PipeError::Empty);
        }

        let joined = rest.join(" ");
        let stages = joined
            .split(separator.as_str())
            .enumerate()
            .map(|(index, part)| {
                let mut tokens = tokenize(part).into_iter();
                tokens
                    .next()
                    .map(|command| PipeStage {
                        command,
                        args: tokens.collect(),
                    })
                    .ok_or(PipeError::EmptyStage(index + 1))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { paste, stages })
    }
}

/// Drives a [`PipePlan`] through the dispatcher.
#[derive(Debug, Clone, Copy)]
pub struct PipeExecutor<'a> {
    dispatcher: &'a CommandDispatcher,
}

impl<'a> PipeExecutor<'a> {
    /// Creates an executor over `dispatcher`.
    pub const fn new(dispatcher: &'a CommandDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Parses `args`, validates the chain and runs it on behalf of `origin`.
    pub async fn run(&self, origin: &Invocation, args: &[String], separator: &str) -> Outcome {
        match PipePlan::parse(args, separator) {
            Ok(plan) => self.execute(origin, &plan).await,
            Err(err) => Outcome::failure(ReasonCode::BadInvocation, format!("Invalid pipe: {err}")),
        }
    }

    /// Checks chain-level constraints without running anything.
    ///
    /// # Errors
    ///
    /// Returns the failure outcome for the first stage that breaks a rule.
    pub fn validate(&self, plan: &PipePlan) -> Result<Vec<Arc<CommandDefinition>>, Outcome> {
        if plan.stages.is_empty() {
            return Err(Outcome::failure(
                ReasonCode::BadInvocation,
                format!("Invalid pipe: {}", PipeError::Empty),
            ));
        }

        let commands = self.dispatcher.commands();
        let mut resolved = Vec::with_capacity(plan.stages.len());

        for (index, stage) in plan.stages.iter().enumerate() {
            let definition = commands
                .resolve(&stage.command)
                .ok_or_else(|| {
                    stage_failure(index, &stage.command, Some(ReasonCode::NoCommand), None)
                })?;
            resolved.push(definition);
        }

        let last = resolved.len().saturating_sub(1);
        for (index, definition) in resolved.iter().enumerate() {
            if index < last && !definition.flags.pipeable {
                return Err(Outcome::failure(
                    ReasonCode::BadInvocation,
                    format!(
                        "Pipe stage {} ({}) cannot be piped into another command",
                        index + 1,
                        definition.name
                    ),
                ));
            }

            let next_is_null = resolved
                .get(index + 1)
                .is_some_and(|next| next.name == NULL_COMMAND);
            if definition.flags.non_nullable && next_is_null {
                return Err(Outcome::failure(
                    ReasonCode::BadInvocation,
                    format!(
                        "Pipe stage {} ({}) cannot have its output discarded",
                        index + 1,
                        definition.name
                    ),
                ));
            }
        }

        Ok(resolved)
    }

    /// Runs a parsed pipe, stopping at the first failure.
    pub async fn execute(&self, origin: &Invocation, plan: &PipePlan) -> Outcome {
        let resolved = match self.validate(plan) {
            Ok(resolved) => resolved,
            Err(outcome) => return outcome,
        };

        let last = resolved.len() - 1;
        let mut carried: Option<String> = None;

        for (index, (stage, definition)) in plan.stages.iter().zip(&resolved).enumerate() {
            let mut args = stage.args.clone();
            if let Some(previous) = carried.take() {
                if plan.paste {
                    args.push(previous);
                } else {
                    args.extend(tokenize(&previous));
                }
            }

            let invocation = origin.derive(&stage.command, args);
            debug!(
                pipe = %origin.id,
                stage = index + 1,
                invocation = %invocation.id,
                command = %definition.name,
                "Running pipe stage"
            );

            let outcome = self
                .dispatcher
                .check_and_execute(&invocation, ExecuteOptions::pipe_stage())
                .await;

            if !outcome.success {
                return stage_failure(
                    index,
                    &definition.name,
                    outcome.reason,
                    outcome.reply.as_deref(),
                );
            }

            match outcome.reply {
                Some(reply) => carried = Some(reply),
                None if index < last => {
                    return stage_failure(
                        index,
                        &definition.name,
                        Some(ReasonCode::EmptyPipeResult),
                        None,
                    );
                }
                None => {}
            }
        }

        Outcome::success(carried)
    }
}

fn stage_failure(
    index: usize,
    command: &str,
    reason: Option<ReasonCode>,
    reply: Option<&str>,
) -> Outcome {
    let text = reason
        .map(ReasonCode::describe)
        .or(reply)
        .unwrap_or("the command failed");

    Outcome {
        success: false,
        reply: Some(format!("Pipe failed at stage {} ({command}): {text}", index + 1)),
        reason,
        cooldown_override: None,
    }
}
