//! Module command registry
//!
//! Optional modules (portals, nether portals, inventories) ship separately.
//! Until one is installed its root command is a placeholder pointing at the
//! download page; when the module finishes loading it activates its real
//! command in place of the placeholder.
//!
//! Every slot holds an `Arc`. Dispatch clones the `Arc` under a read lock and
//! runs the command after releasing it, so a concurrent activation never
//! disturbs a command that is already executing.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::types::CommandDefinition;

struct ModuleSlot {
    command: Arc<CommandDefinition>,
    activated: bool,
}

/// Maps module keys to the command currently active for each module
#[derive(Default)]
pub struct ModuleCommandRegistry {
    slots: RwLock<HashMap<String, ModuleSlot>>,
}

impl ModuleCommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a placeholder command for a module that is not loaded yet
    ///
    /// Registering twice for the same key overwrites; the replaced command is
    /// returned.
    pub fn register_placeholder(
        &self,
        module_key: impl Into<String>,
        placeholder: impl Into<Arc<CommandDefinition>>,
    ) -> Option<Arc<CommandDefinition>> {
        let module_key = normalize(module_key.into());
        let slot = ModuleSlot {
            command: placeholder.into(),
            activated: false,
        };
        let previous = self.slots.write().insert(module_key.clone(), slot);
        if previous.is_some() {
            warn!(module = %module_key, "Placeholder registered twice, keeping the latest");
        }
        previous.map(|slot| slot.command)
    }

    /// Swap the module's real command in for whatever is registered under `module_key`
    ///
    /// Returns the command that was active immediately before, or `None` if the
    /// key was unknown. Every dispatch that resolves after this returns sees
    /// `real`.
    pub fn activate_module(
        &self,
        module_key: impl Into<String>,
        real: impl Into<Arc<CommandDefinition>>,
    ) -> Option<Arc<CommandDefinition>> {
        let module_key = normalize(module_key.into());
        let slot = ModuleSlot {
            command: real.into(),
            activated: true,
        };
        let command_name = slot.command.name.clone();
        let previous = self.slots.write().insert(module_key.clone(), slot);

        match &previous {
            Some(old) => info!(
                module = %module_key,
                command = %command_name,
                replaced = %old.command.name,
                "Module command activated"
            ),
            None => info!(
                module = %module_key,
                command = %command_name,
                "Module command activated without placeholder"
            ),
        }
        previous.map(|slot| slot.command)
    }

    /// Get the command registered under a module key
    pub fn get(&self, module_key: &str) -> Option<Arc<CommandDefinition>> {
        self.slots
            .read()
            .get(&module_key.to_lowercase())
            .map(|slot| Arc::clone(&slot.command))
    }

    /// Resolve a dispatch name against the live module commands
    ///
    /// The module key itself is tried first, then command names and aliases.
    /// When several modules answer to the same name the lowest key wins.
    pub fn resolve(&self, name: &str) -> Option<Arc<CommandDefinition>> {
        let slots = self.slots.read();
        if let Some(slot) = slots.get(&name.to_lowercase()) {
            return Some(Arc::clone(&slot.command));
        }
        slots
            .iter()
            .filter(|(_, slot)| slot.command.matches(name))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, slot)| Arc::clone(&slot.command))
    }

    /// Check whether the module is still served by its placeholder
    pub fn is_placeholder(&self, module_key: &str) -> bool {
        self.slots
            .read()
            .get(&module_key.to_lowercase())
            .is_some_and(|slot| !slot.activated)
    }

    /// Check whether the module has been activated
    pub fn is_active(&self, module_key: &str) -> bool {
        self.slots
            .read()
            .get(&module_key.to_lowercase())
            .is_some_and(|slot| slot.activated)
    }

    /// All module keys, sorted
    pub fn module_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.slots.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of the live commands
    pub fn commands(&self) -> Vec<Arc<CommandDefinition>> {
        self.slots
            .read()
            .values()
            .map(|slot| Arc::clone(&slot.command))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalize(key: String) -> String {
    key.to_lowercase()
}

impl std::fmt::Debug for ModuleCommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCommandRegistry")
            .field("modules", &self.module_keys())
            .finish()
    }
}
