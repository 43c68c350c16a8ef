//! Commands shipped with the bot

mod basic;
mod filters;
mod pipe;
mod reset;

pub use basic::{NullCommand, PokeCommand, SayCommand};
pub use filters::FilterCommand;
pub use pipe::PipeCommand;
pub use reset::ResetCommand;

use crate::definition::{CommandDefinition, CommandFlags, Permission};
use crate::filter::FilterKind;
use crate::pipe::NULL_COMMAND;
use crate::registry::CommandRegistry;
use pipebot_common::Result;
use pipebot_config::Config;
use std::time::Duration;
use tracing::info;

const FILTER_COOLDOWN: Duration = Duration::from_secs(5);

/// Register all built-in commands and apply configured overrides
///
/// # Errors
///
/// Fails when a built-in name clashes with an already registered command.
pub fn register_all(registry: &mut CommandRegistry, config: &Config) -> Result<()> {
    let pipeable = CommandFlags {
        pipeable: true,
        ..CommandFlags::default()
    };
    let mentionable = CommandFlags {
        mentionable: true,
        ..CommandFlags::default()
    };
    let targeted = CommandFlags {
        blockable: true,
        opt_outable: true,
        mentionable: true,
        ..CommandFlags::default()
    };
    let filter_flags = CommandFlags {
        mentionable: true,
        non_nullable: true,
        ..CommandFlags::default()
    };

    registry.register(
        CommandDefinition::new("say", SayCommand)
            .with_aliases(&["echo"])
            .with_description("Repeats its arguments")
            .with_flags(pipeable),
    )?;

    registry.register(
        CommandDefinition::new(NULL_COMMAND, NullCommand)
            .with_aliases(&["discard"])
            .with_description("Discards its input")
            .with_cooldown(Duration::ZERO)
            .with_flags(pipeable),
    )?;

    registry.register(
        CommandDefinition::new("poke", PokeCommand)
            .with_description("Pokes another user")
            .with_flags(targeted),
    )?;

    registry.register(
        CommandDefinition::new("pipe", PipeCommand::new(config.bot.pipe_separator.clone()))
            .with_description("Runs commands in sequence, feeding each reply into the next")
            .with_cooldown(Duration::from_secs(5))
            .with_flags(mentionable),
    )?;

    for (name, kind, enable) in [
        ("block", FilterKind::Block, true),
        ("unblock", FilterKind::Block, false),
        ("optout", FilterKind::OptOut, true),
        ("unoptout", FilterKind::OptOut, false),
        ("unmention", FilterKind::Unmention, true),
        ("remention", FilterKind::Unmention, false),
        ("unping", FilterKind::Unping, true),
        ("reping", FilterKind::Unping, false),
    ] {
        let command = FilterCommand::new(kind, enable);
        let description = command.usage(name);
        registry.register(
            CommandDefinition::new(name, command)
                .with_description(description)
                .with_cooldown(FILTER_COOLDOWN)
                .with_flags(filter_flags),
        )?;
    }

    registry.register(
        CommandDefinition::new("reset", ResetCommand)
            .with_description("Clears a user's cooldowns and pending command")
            .with_cooldown(Duration::ZERO)
            .with_flags(mentionable)
            .with_permission(Permission::Administrator),
    )?;

    registry.apply_overrides(config);
    info!(count = registry.len(), "Registered built-in commands");
    Ok(())
}
