//! In-memory grant table
//!
//! Hosts with their own authorization system implement [`CapabilityCheck`]
//! directly. The grant table covers embedded hosts and tests: it maps issuer
//! ids to granted permission patterns and can be loaded from a JSON file.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::glob_matcher::GlobMatcher;
use crate::issuer::{Issuer, IssuerId};
use crate::permission::CapabilityCheck;

/// Serialized form of a grant table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantConfig {
    /// Whether the console implicitly holds every permission
    #[serde(default = "default_console_has_all")]
    pub console_has_all: bool,
    /// Granted patterns keyed by issuer id
    #[serde(default)]
    pub grants: HashMap<IssuerId, Vec<String>>,
}

fn default_console_has_all() -> bool {
    true
}

impl Default for GrantConfig {
    fn default() -> Self {
        Self {
            console_has_all: default_console_has_all(),
            grants: HashMap::new(),
        }
    }
}

/// Thread-safe table of granted permission patterns
#[derive(Debug)]
pub struct GrantTable {
    grants: RwLock<HashMap<IssuerId, Vec<String>>>,
    console_has_all: bool,
    matcher: GlobMatcher,
}

impl GrantTable {
    /// Create an empty table where the console holds every permission
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
            console_has_all: true,
            matcher: GlobMatcher::new(),
        }
    }

    /// Build a table from its serialized configuration, validating every pattern
    pub fn from_config(config: GrantConfig) -> Result<Self> {
        let table = Self {
            grants: RwLock::new(HashMap::new()),
            console_has_all: config.console_has_all,
            matcher: GlobMatcher::new(),
        };
        for (issuer, patterns) in config.grants {
            for pattern in patterns {
                table.grant(issuer.clone(), pattern)?;
            }
        }
        Ok(table)
    }

    /// Load a table from a JSON file; a missing file yields an empty table
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "Grant file not found, using empty grant table");
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let config: GrantConfig = serde_json::from_str(&content)?;
        Self::from_config(config)
    }

    /// Snapshot the table as configuration
    pub fn to_config(&self) -> GrantConfig {
        GrantConfig {
            console_has_all: self.console_has_all,
            grants: self.grants.read().clone(),
        }
    }

    /// Grant a permission pattern to an issuer
    pub fn grant(&self, issuer: impl Into<IssuerId>, pattern: impl Into<String>) -> Result<()> {
        let pattern = pattern.into();
        self.matcher.validate_pattern(&pattern)?;

        let mut grants = self.grants.write();
        let patterns = grants.entry(issuer.into()).or_default();
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
        Ok(())
    }

    /// Revoke a previously granted pattern; returns whether it was present
    pub fn revoke(&self, issuer: &IssuerId, pattern: &str) -> bool {
        let mut grants = self.grants.write();
        let Some(patterns) = grants.get_mut(issuer) else {
            return false;
        };
        let before = patterns.len();
        patterns.retain(|p| p != pattern);
        let removed = patterns.len() != before;
        if patterns.is_empty() {
            grants.remove(issuer);
        }
        removed
    }

    /// Patterns granted to an issuer
    pub fn granted(&self, issuer: &IssuerId) -> Vec<String> {
        self.grants.read().get(issuer).cloned().unwrap_or_default()
    }
}

impl Default for GrantTable {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityCheck for GrantTable {
    fn has_capability(&self, issuer: &Issuer, token: &str) -> bool {
        if self.console_has_all && issuer.is_console() {
            return true;
        }

        self.grants
            .read()
            .get(&issuer.id)
            .map(|patterns| {
                patterns
                    .iter()
                    .any(|pattern| self.matcher.match_pattern(pattern, token))
            })
            .unwrap_or(false)
    }
}
