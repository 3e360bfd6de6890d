use crate::error::{CommandError, Result};
use crate::types::CommandDefinition;
use std::collections::HashMap;
use std::sync::Arc;

/// Table of the built-in commands, keyed by lowercase name
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, Arc<CommandDefinition>>,
    /// Alias to command name
    aliases: HashMap<String, String>,
}

impl CommandRegistry {
    /// Create a new empty command registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command
    ///
    /// Fails if the name is empty or the name or one of the aliases is
    /// already taken by another command.
    pub fn register(&mut self, command: CommandDefinition) -> Result<()> {
        if command.name.trim().is_empty() {
            return Err(CommandError::InvalidCommandName(
                "Command name cannot be empty".to_string(),
            ));
        }

        for label in std::iter::once(&command.name).chain(command.aliases.iter()) {
            if self.resolve(label).is_some() {
                return Err(CommandError::InvalidCommandName(format!(
                    "Command already registered: {}",
                    label
                )));
            }
        }

        for alias in &command.aliases {
            self.aliases.insert(alias.clone(), command.name.clone());
        }
        self.commands
            .insert(command.name.clone(), Arc::new(command));
        Ok(())
    }

    /// Unregister a command and its aliases
    pub fn unregister(&mut self, name: &str) -> Result<Arc<CommandDefinition>> {
        let command = self
            .commands
            .remove(&name.to_lowercase())
            .ok_or_else(|| CommandError::CommandNotFound(name.to_string()))?;
        self.aliases.retain(|_, target| *target != command.name);
        Ok(command)
    }

    /// Get a command by name
    pub fn get(&self, name: &str) -> Result<Arc<CommandDefinition>> {
        self.resolve(name)
            .ok_or_else(|| CommandError::CommandNotFound(name.to_string()))
    }

    /// Look up a command by name or alias
    pub fn resolve(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        let name = name.to_lowercase();
        let canonical = self.aliases.get(&name).unwrap_or(&name);
        self.commands.get(canonical).cloned()
    }

    /// Get all commands, sorted by name
    pub fn list_all(&self) -> Vec<Arc<CommandDefinition>> {
        let mut commands: Vec<_> = self.commands.values().cloned().collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    /// Get the number of registered commands
    pub fn count(&self) -> usize {
        self.commands.len()
    }
}
