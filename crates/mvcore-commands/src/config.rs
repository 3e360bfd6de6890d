use crate::error::{CommandError, Result};
use mvcore_permissions::PermissionExpression;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Confirmation queue settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// How long a pending confirmation stays valid
    pub expiry_secs: u64,

    /// How often the background sweeper runs
    pub sweep_interval_secs: u64,

    /// Whether re-issuing the same confirmable command confirms it
    pub reissue_confirms: bool,
}

impl ConfirmationConfig {
    pub fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            expiry_secs: 30,
            sweep_interval_secs: 60,
            reissue_confirms: true,
        }
    }
}

/// An optional module whose root command starts out as a placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Module key, also the placeholder's command name
    pub key: String,

    /// Human-readable module name
    pub display_name: String,

    /// Where the module can be downloaded
    pub download_url: String,
}

impl ModuleConfig {
    pub fn new(
        key: impl Into<String>,
        display_name: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            download_url: download_url.into(),
        }
    }
}

/// The optional Multiverse modules
pub fn default_modules() -> Vec<ModuleConfig> {
    vec![
        ModuleConfig::new(
            "mvnp",
            "Multiverse-NetherPortals",
            "https://dev.bukkit.org/projects/multiverse-netherportals",
        ),
        ModuleConfig::new(
            "mvp",
            "Multiverse-Portals",
            "https://dev.bukkit.org/projects/multiverse-portals",
        ),
        ModuleConfig::new(
            "mvinv",
            "Multiverse-Inventories",
            "https://dev.bukkit.org/projects/multiverse-inventories",
        ),
    ]
}

/// Dispatcher configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub confirmation: ConfirmationConfig,

    /// Name of the command that confirms pending actions
    pub confirm_command: String,

    /// Permission required to use the confirm command
    pub confirm_permission: PermissionExpression,

    /// Modules that get a placeholder command at startup
    pub modules: Vec<ModuleConfig>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            confirmation: ConfirmationConfig::default(),
            confirm_command: "confirm".to_string(),
            confirm_permission: PermissionExpression::Unrestricted,
            modules: default_modules(),
        }
    }
}

impl DispatcherConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.confirmation.expiry_secs == 0 {
            return Err(CommandError::ConfigError(
                "confirmation.expiry_secs must be greater than zero".to_string(),
            ));
        }

        if self.confirmation.sweep_interval_secs == 0 {
            return Err(CommandError::ConfigError(
                "confirmation.sweep_interval_secs must be greater than zero".to_string(),
            ));
        }

        if self.confirm_command.trim().is_empty()
            || self.confirm_command.chars().any(char::is_whitespace)
        {
            return Err(CommandError::ConfigError(format!(
                "Invalid confirm command name: '{}'",
                self.confirm_command
            )));
        }

        let mut seen = HashSet::new();
        for module in &self.modules {
            let key = module.key.trim().to_lowercase();
            if key.is_empty() {
                return Err(CommandError::ConfigError(
                    "Module key cannot be empty".to_string(),
                ));
            }
            if !seen.insert(key) {
                return Err(CommandError::ConfigError(format!(
                    "Duplicate module key: {}",
                    module.key
                )));
            }
        }

        Ok(())
    }
}

/// Loads dispatcher configuration files
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from a YAML file
    pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<DispatcherConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| CommandError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: DispatcherConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<DispatcherConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| CommandError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: DispatcherConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file (auto-detect format)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<DispatcherConfig> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        match extension {
            "yaml" | "yml" => Self::load_from_yaml(path),
            "json" => Self::load_from_json(path),
            _ => Err(CommandError::ConfigError(
                "Unsupported file format. Use .yaml, .yml, or .json".to_string(),
            )),
        }
    }
}
