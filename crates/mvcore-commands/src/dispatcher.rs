//! Command dispatch
//!
//! The dispatcher resolves a command name, checks the issuer's permission and
//! either runs the handler or, for destructive commands, parks it in the
//! confirmation queue until the issuer confirms.

use mvcore_permissions::{CapabilityCheck, Issuer, PermissionChecker, PermissionExpression};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::DispatcherConfig;
use crate::error::{CommandError, Result};
use crate::modules::ModuleCommandRegistry;
use crate::queue::{ConfirmationQueue, DeferredAction};
use crate::registry::CommandRegistry;
use crate::types::{CommandDefinition, CommandOutput, Invocation};

/// Result of a dispatch that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The command ran
    Executed(CommandOutput),

    /// The command was queued; the issuer has to confirm it
    ConfirmationRequired {
        command: String,
        coalesce_key: String,
        /// Name of the command that confirms it
        confirm_command: String,
        expires_in: Duration,
    },

    /// A confirmation was requested but nothing (live) was pending
    NothingToConfirm,
}

/// Routes invocations through permission checks and the confirmation queue
pub struct CommandDispatcher {
    registry: CommandRegistry,
    modules: Arc<ModuleCommandRegistry>,
    queue: Arc<ConfirmationQueue>,
    permissions: PermissionChecker,
    confirm_command: String,
    confirm_permission: PermissionExpression,
    reissue_confirms: bool,
    sweep_interval: Duration,
}

impl CommandDispatcher {
    /// Create a dispatcher from explicit collaborators
    pub fn new(
        capabilities: Arc<dyn CapabilityCheck>,
        queue: Arc<ConfirmationQueue>,
        modules: Arc<ModuleCommandRegistry>,
    ) -> Self {
        let defaults = DispatcherConfig::default();
        Self {
            registry: CommandRegistry::new(),
            modules,
            queue,
            permissions: PermissionChecker::new(capabilities),
            confirm_command: defaults.confirm_command,
            confirm_permission: defaults.confirm_permission,
            reissue_confirms: defaults.confirmation.reissue_confirms,
            sweep_interval: defaults.confirmation.sweep_interval(),
        }
    }

    /// Create a dispatcher from configuration
    ///
    /// Builds the queue with the configured expiry and installs a placeholder
    /// for every configured module.
    pub fn from_config(
        config: &DispatcherConfig,
        capabilities: Arc<dyn CapabilityCheck>,
    ) -> Result<Self> {
        config.validate()?;

        let modules = Arc::new(ModuleCommandRegistry::new());
        for module in &config.modules {
            modules.register_placeholder(module.key.clone(), CommandDefinition::placeholder(module));
        }
        let queue = Arc::new(ConfirmationQueue::with_expiry(config.confirmation.expiry()));

        Ok(Self::new(capabilities, queue, modules)
            .with_confirm_command(config.confirm_command.clone())
            .with_confirm_permission(config.confirm_permission.clone())
            .with_reissue_confirms(config.confirmation.reissue_confirms)
            .with_sweep_interval(config.confirmation.sweep_interval()))
    }

    /// Set the name of the confirm command
    pub fn with_confirm_command(mut self, name: impl Into<String>) -> Self {
        self.confirm_command = name.into().to_lowercase();
        self
    }

    /// Set the permission required to confirm
    pub fn with_confirm_permission(mut self, permission: impl Into<PermissionExpression>) -> Self {
        self.confirm_permission = permission.into();
        self
    }

    /// Set whether re-issuing a pending command confirms it
    pub fn with_reissue_confirms(mut self, enabled: bool) -> Self {
        self.reissue_confirms = enabled;
        self
    }

    /// Set how often [`spawn_queue_sweeper`](Self::spawn_queue_sweeper) sweeps
    pub fn with_sweep_interval(mut self, every: Duration) -> Self {
        self.sweep_interval = every;
        self
    }

    /// Register a built-in command
    pub fn register_command(&mut self, command: CommandDefinition) -> Result<()> {
        if command.matches(&self.confirm_command) {
            return Err(CommandError::InvalidCommandName(format!(
                "'{}' is reserved for confirmations",
                self.confirm_command
            )));
        }
        debug!(command = %command.name, permission = %command.permission, "Registering command");
        self.registry.register(command)
    }

    /// Unregister a built-in command
    pub fn unregister_command(&mut self, name: &str) -> Result<Arc<CommandDefinition>> {
        self.registry.unregister(name)
    }

    /// Shared handle to the module registry, for module loaders
    pub fn modules(&self) -> Arc<ModuleCommandRegistry> {
        Arc::clone(&self.modules)
    }

    /// Shared handle to the confirmation queue
    pub fn queue(&self) -> Arc<ConfirmationQueue> {
        Arc::clone(&self.queue)
    }

    /// The built-in command table
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn confirm_command(&self) -> &str {
        &self.confirm_command
    }

    /// Start the periodic sweep of stale confirmations on the current tokio runtime
    pub fn spawn_queue_sweeper(&self) -> JoinHandle<()> {
        ConfirmationQueue::spawn_sweeper(&self.queue, self.sweep_interval)
    }

    /// Resolve a command name: built-in commands first, then module commands
    pub fn resolve(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        self.registry
            .resolve(name)
            .or_else(|| self.modules.resolve(name))
    }

    /// Check whether `issuer` may run the named command
    pub fn can_run(&self, issuer: &Issuer, name: &str) -> bool {
        if name.eq_ignore_ascii_case(&self.confirm_command) {
            return self.permissions.check(issuer, &self.confirm_permission);
        }
        self.resolve(name)
            .is_some_and(|cmd| self.permissions.check(issuer, &cmd.permission))
    }

    /// Commands the issuer may run, sorted by name
    ///
    /// Module commands whose name dispatches to something else (a built-in
    /// command or another module) are left out.
    pub fn visible_commands(&self, issuer: &Issuer) -> Vec<Arc<CommandDefinition>> {
        let reachable_modules = self.modules.commands().into_iter().filter(|cmd| {
            self.resolve(&cmd.name)
                .is_some_and(|live| Arc::ptr_eq(&live, cmd))
        });
        let mut commands: Vec<_> = self
            .registry
            .list_all()
            .into_iter()
            .chain(reachable_modules)
            .filter(|cmd| self.permissions.check(issuer, &cmd.permission))
            .collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    /// Dispatch an invocation
    pub fn dispatch(
        &self,
        issuer: &Issuer,
        name: &str,
        args: Vec<String>,
    ) -> Result<DispatchOutcome> {
        if name.eq_ignore_ascii_case(&self.confirm_command) {
            return self.confirm(issuer);
        }

        let command = self
            .resolve(name)
            .ok_or_else(|| CommandError::CommandNotFound(name.to_string()))?;

        if !self.permissions.check(issuer, &command.permission) {
            return Err(CommandError::PermissionDenied {
                command: command.name.clone(),
            });
        }

        let invocation = Invocation::new(issuer.clone(), command.name.clone(), args);
        if !command.requires_confirmation {
            return command.execute(&invocation).map(DispatchOutcome::Executed);
        }

        let coalesce_key = invocation.coalesce_key();
        if self.reissue_confirms {
            if let Some(action) = self.queue.take_matching(&issuer.id, &coalesce_key) {
                debug!(issuer = %issuer.id, key = %coalesce_key, "Re-issued command confirmed");
                return action().map(DispatchOutcome::Executed);
            }
        }

        let handler = command.handler();
        let action: DeferredAction = Box::new(move || handler(&invocation));
        self.queue
            .enqueue(&issuer.id, action, Some(coalesce_key.clone()));

        Ok(DispatchOutcome::ConfirmationRequired {
            command: command.name.clone(),
            coalesce_key,
            confirm_command: self.confirm_command.clone(),
            expires_in: self.queue.expiry(),
        })
    }

    /// Run the issuer's pending command, if any
    pub fn confirm(&self, issuer: &Issuer) -> Result<DispatchOutcome> {
        if !self.permissions.check(issuer, &self.confirm_permission) {
            return Err(CommandError::PermissionDenied {
                command: self.confirm_command.clone(),
            });
        }

        match self.queue.try_confirm(&issuer.id) {
            Some(action) => {
                info!(issuer = %issuer.id, "Running confirmed command");
                action().map(DispatchOutcome::Executed)
            }
            None => Ok(DispatchOutcome::NothingToConfirm),
        }
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("commands", &self.registry.count())
            .field("modules", &self.modules)
            .field("queue", &self.queue)
            .field("confirm_command", &self.confirm_command)
            .finish_non_exhaustive()
    }
}
