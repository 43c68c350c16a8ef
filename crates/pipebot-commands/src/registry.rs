//! Command registry for resolving invocations to definitions

use crate::definition::CommandDefinition;
use pipebot_common::{PipebotError, Result};
use pipebot_config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of every command the bot answers to.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandDefinition>>,
    names: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command under its name and aliases.
    ///
    /// # Errors
    ///
    /// Fails when the name or an alias is already taken.
    pub fn register(&mut self, definition: CommandDefinition) -> Result<()> {
        if let Some(taken) = definition.names().find(|n| self.names.contains_key(*n)) {
            return Err(PipebotError::validation_field(
                format!("Command name '{taken}' is already registered"),
                "name",
            ));
        }

        let index = self.commands.len();
        for name in definition.names() {
            self.names.insert(name.to_string(), index);
        }
        debug!(command = %definition.name, aliases = ?definition.aliases, "Registered command");
        self.commands.push(Arc::new(definition));
        Ok(())
    }

    /// Finds a command by name or alias, ignoring case.
    pub fn resolve(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        self.names
            .get(&name.to_lowercase())
            .and_then(|&index| self.commands.get(index))
            .cloned()
    }

    /// Applies per-command configuration overrides.
    ///
    /// Overrides naming unknown commands are ignored.
    pub fn apply_overrides(&mut self, config: &Config) {
        for definition in &mut self.commands {
            if let Some(cooldown) = config.cooldown_override(&definition.name) {
                debug!(command = %definition.name, ?cooldown, "Applying cooldown override");
                Arc::make_mut(definition).cooldown = cooldown;
            }
        }
    }

    /// Every registered command, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandDefinition>> {
        self.commands.iter()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
