use mvcore_permissions::{Issuer, PermissionExpression};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::config::ModuleConfig;
use crate::error::Result;

/// Handler run when a command executes
///
/// Handlers receive an invocation whose arguments were already resolved by
/// the host's argument parser.
pub type CommandHandler = Arc<dyn Fn(&Invocation) -> Result<CommandOutput> + Send + Sync>;

/// A single resolved command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Who issued the command
    pub issuer: Issuer,

    /// Canonical command name (aliases are resolved before the handler runs)
    pub command: String,

    /// Positional arguments
    pub args: Vec<String>,
}

impl Invocation {
    /// Create a new invocation
    pub fn new(issuer: Issuer, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            issuer,
            command: command.into(),
            args,
        }
    }

    /// Get a positional argument
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Label distinguishing this invocation's confirmable flow, e.g. `delete worldA`
    pub fn coalesce_key(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }
}

/// Messages a command sends back to its issuer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub messages: Vec<String>,
}

impl CommandOutput {
    /// Create an empty output
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an output holding a single message
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// Append a message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A command definition: metadata, permission requirement and handler
#[derive(Clone)]
pub struct CommandDefinition {
    /// Command name, matched case-insensitively
    pub name: String,

    /// Alternative names
    pub aliases: Vec<String>,

    /// Description of what the command does
    pub description: String,

    /// Usage syntax, e.g. `<world>`
    pub usage: String,

    /// Permission required to run the command
    pub permission: PermissionExpression,

    /// Whether the command is deferred until the issuer confirms it
    pub requires_confirmation: bool,

    /// Whether this is a stand-in for a module that is not installed
    pub placeholder: bool,

    handler: CommandHandler,
}

impl CommandDefinition {
    /// Create a new command definition
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<CommandOutput> + Send + Sync + 'static,
    {
        Self {
            name: name.into().to_lowercase(),
            aliases: Vec::new(),
            description: String::new(),
            usage: String::new(),
            permission: PermissionExpression::Unrestricted,
            requires_confirmation: false,
            placeholder: false,
            handler: Arc::new(handler),
        }
    }

    /// Create the stand-in command for a module that is not installed yet
    pub fn placeholder(module: &ModuleConfig) -> Self {
        let reply = format!(
            "{} is not installed. Get it at {}",
            module.display_name, module.download_url
        );
        let mut command = Self::new(module.key.clone(), move |_: &Invocation| {
            Ok(CommandOutput::message(reply.clone()))
        })
        .with_description(format!("Download link for {}", module.display_name));
        command.placeholder = true;
        command
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the usage syntax
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Add an alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    /// Set the permission requirement, parsing string forms once here
    pub fn with_permission(mut self, permission: impl Into<PermissionExpression>) -> Self {
        self.permission = permission.into();
        self
    }

    /// Mark the command as requiring confirmation
    pub fn with_confirmation(mut self, required: bool) -> Self {
        self.requires_confirmation = required;
        self
    }

    /// Check whether `name` refers to this command by name or alias
    pub fn matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
    }

    /// Run the handler
    pub fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
        (self.handler)(invocation)
    }

    /// Shared handle to the handler, for deferred execution
    pub fn handler(&self) -> CommandHandler {
        Arc::clone(&self.handler)
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .field("requires_confirmation", &self.requires_confirmation)
            .field("placeholder", &self.placeholder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &Invocation) -> Result<CommandOutput> {
        Ok(CommandOutput::new())
    }

    #[test]
    fn test_coalesce_key() {
        let issuer = Issuer::player("p1", "P1");
        let inv = Invocation::new(issuer.clone(), "delete", vec!["worldA".to_string()]);
        assert_eq!(inv.coalesce_key(), "delete worldA");

        let inv = Invocation::new(issuer, "purge", vec![]);
        assert_eq!(inv.coalesce_key(), "purge");
    }

    #[test]
    fn test_invocation_arg() {
        let inv = Invocation::new(Issuer::console(), "clone", vec!["a".into(), "b".into()]);
        assert_eq!(inv.arg(1), Some("b"));
        assert_eq!(inv.arg(2), None);
    }

    #[test]
    fn test_definition_builder() {
        let cmd = CommandDefinition::new("Delete", noop)
            .with_description("Deletes a world")
            .with_usage("<world>")
            .with_alias("del")
            .with_permission("multiverse.core.delete")
            .with_confirmation(true);

        assert_eq!(cmd.name, "delete");
        assert!(cmd.requires_confirmation);
        assert!(!cmd.placeholder);
        assert_eq!(cmd.permission.to_string(), "multiverse.core.delete");
        assert!(cmd.matches("DELETE"));
        assert!(cmd.matches("del"));
        assert!(!cmd.matches("regen"));
    }

    #[test]
    fn test_placeholder_replies_with_download_link() {
        let module = ModuleConfig::new(
            "mvp",
            "Multiverse-Portals",
            "https://dev.bukkit.org/projects/multiverse-portals",
        );
        let cmd = CommandDefinition::placeholder(&module);
        assert!(cmd.placeholder);
        assert!(cmd.permission.is_unrestricted());

        let output = cmd
            .execute(&Invocation::new(Issuer::console(), "mvp", vec![]))
            .unwrap();
        assert_eq!(
            output.messages,
            vec![
                "Multiverse-Portals is not installed. Get it at https://dev.bukkit.org/projects/multiverse-portals"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_command_output_builder() {
        let output = CommandOutput::message("one").with_message("two");
        assert_eq!(output.messages.len(), 2);
        assert!(CommandOutput::new().is_empty());
    }
}
