//! Command issuers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity key of an issuer (a player UUID, or `console`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuerId(String);

impl IssuerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssuerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IssuerId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// What kind of actor issued a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssuerKind {
    Player,
    Console,
}

/// The actor invoking a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// Identity key; confirmation state is tracked per id
    pub id: IssuerId,
    /// Display name used in messages
    pub name: String,
    pub kind: IssuerKind,
}

impl Issuer {
    /// Create a player issuer
    pub fn player(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: IssuerId::new(id),
            name: name.into(),
            kind: IssuerKind::Player,
        }
    }

    /// The server console
    pub fn console() -> Self {
        Self {
            id: IssuerId::new("console"),
            name: "CONSOLE".to_string(),
            kind: IssuerKind::Console,
        }
    }

    pub fn is_console(&self) -> bool {
        self.kind == IssuerKind::Console
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
