//! Permission expression data model
//!
//! Commands declare their permission as a string. A plain comma separated list
//! (`multiverse.core.delete,multiverse.core.purge`) is satisfied by holding any
//! one of the tokens; prefixing the list with `AND:` requires all of them.
//! Strings are parsed once, when the command is defined, into a
//! [`PermissionExpression`].
//!
//! Parsing never fails. Input that does not fit the grammar degrades to a
//! single-token `Any` holding the raw string.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::issuer::Issuer;
use crate::permission::checker::CapabilityCheck;

/// Prefix selecting conjunctive evaluation
pub const AND_PREFIX: &str = "AND:";

/// Marker token selecting conjunctive evaluation in token-set form
const AND_MARKER: &str = "AND";

const SEPARATOR: char = ',';

/// A parsed permission requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PermissionExpression {
    /// No requirement; produced from empty or absent input
    #[default]
    Unrestricted,
    /// Satisfied when the issuer holds at least one token
    Any(Vec<String>),
    /// Satisfied when the issuer holds every token
    All(Vec<String>),
}

impl PermissionExpression {
    /// Parse a raw permission string
    ///
    /// `None`, `""` and whitespace-only input yield [`Unrestricted`].
    ///
    /// [`Unrestricted`]: PermissionExpression::Unrestricted
    pub fn parse(raw: Option<&str>) -> Self {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Self::Unrestricted,
            Some(raw) => raw,
        };

        let (conjunctive, body) = match raw.strip_prefix(AND_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let tokens = split_tokens(body);
        if tokens.is_empty() {
            return Self::Any(vec![raw.to_string()]);
        }

        if conjunctive {
            Self::All(tokens)
        } else {
            Self::Any(tokens)
        }
    }

    /// Build an expression from an already split permission set
    ///
    /// A literal `AND` marker among the tokens selects conjunctive evaluation
    /// and is not itself treated as a permission.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut conjunctive = false;
        let mut collected = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim();
            if token == AND_MARKER {
                conjunctive = true;
            } else if !token.is_empty() && !collected.iter().any(|t: &String| t == token) {
                collected.push(token.to_string());
            }
        }

        match (conjunctive, collected.is_empty()) {
            (false, true) => Self::Unrestricted,
            (true, true) => Self::Any(vec![AND_MARKER.to_string()]),
            (true, false) => Self::All(collected),
            (false, false) => Self::Any(collected),
        }
    }

    /// Evaluate the expression for an issuer
    ///
    /// Tokens are checked in no particular order and evaluation stops as soon
    /// as the outcome is known, so checks must be free of side effects the
    /// caller relies on.
    pub fn evaluate<C>(&self, issuer: &Issuer, check: &C) -> bool
    where
        C: CapabilityCheck + ?Sized,
    {
        match self {
            Self::Unrestricted => true,
            Self::Any(tokens) => tokens.iter().any(|t| check.has_capability(issuer, t)),
            Self::All(tokens) => tokens.iter().all(|t| check.has_capability(issuer, t)),
        }
    }

    /// Tokens referenced by this expression
    pub fn tokens(&self) -> &[String] {
        match self {
            Self::Unrestricted => &[],
            Self::Any(tokens) | Self::All(tokens) => tokens,
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }
}

fn split_tokens(body: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in body.split(SEPARATOR).map(str::trim) {
        if !token.is_empty() && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

impl fmt::Display for PermissionExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => Ok(()),
            Self::Any(tokens) => write!(f, "{}", tokens.join(",")),
            Self::All(tokens) => write!(f, "{}{}", AND_PREFIX, tokens.join(",")),
        }
    }
}

impl FromStr for PermissionExpression {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(Some(s)))
    }
}

impl From<&str> for PermissionExpression {
    fn from(value: &str) -> Self {
        Self::parse(Some(value))
    }
}

impl From<Option<&str>> for PermissionExpression {
    fn from(value: Option<&str>) -> Self {
        Self::parse(value)
    }
}

impl From<String> for PermissionExpression {
    fn from(value: String) -> Self {
        Self::parse(Some(value.as_str()))
    }
}

impl From<PermissionExpression> for String {
    fn from(value: PermissionExpression) -> Self {
        value.to_string()
    }
}
