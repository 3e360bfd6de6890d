//! Multiverse command dispatch
//!
//! This crate routes command invocations through permission checks, defers
//! destructive commands until the issuer confirms them, and lets optional
//! modules replace their placeholder commands at runtime.
//!
//! # Examples
//!
//! ```ignore
//! use mvcore_commands::{CommandDefinition, CommandDispatcher, CommandOutput, DispatcherConfig};
//! use mvcore_permissions::{GrantTable, Issuer};
//! use std::sync::Arc;
//!
//! let grants = Arc::new(GrantTable::new());
//! let mut dispatcher = CommandDispatcher::from_config(&DispatcherConfig::default(), grants)?;
//!
//! dispatcher.register_command(
//!     CommandDefinition::new("delete", |inv| {
//!         Ok(CommandOutput::message(format!("Deleted {}", inv.arg(0).unwrap_or_default())))
//!     })
//!     .with_permission("multiverse.core.delete")
//!     .with_confirmation(true),
//! )?;
//!
//! // Queued; the console has to run `confirm` next
//! dispatcher.dispatch(&Issuer::console(), "delete", vec!["world_nether".into()])?;
//! dispatcher.dispatch(&Issuer::console(), "confirm", vec![])?;
//!
//! // Later, once the portals module has loaded
//! dispatcher.modules().activate_module("mvp", portals_root_command());
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod modules;
pub mod queue;
pub mod registry;
pub mod types;

pub use config::{ConfigManager, ConfirmationConfig, DispatcherConfig, ModuleConfig};
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use error::{CommandError, Result};
pub use modules::ModuleCommandRegistry;
pub use queue::{ConfirmationQueue, DeferredAction, PendingSummary, DEFAULT_EXPIRY};
pub use registry::CommandRegistry;
pub use types::{CommandDefinition, CommandHandler, CommandOutput, Invocation};
