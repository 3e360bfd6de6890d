//! Wildcard matching of granted permission patterns

use crate::error::{Error, Result};

/// Matches granted patterns such as `multiverse.core.*` against permission tokens
#[derive(Debug, Clone, Default)]
pub struct GlobMatcher;

impl GlobMatcher {
    /// Create a new glob matcher
    pub fn new() -> Self {
        Self
    }

    /// Match a permission token against a granted pattern
    ///
    /// Supports:
    /// - `*` to match any sequence of characters (including `.`)
    /// - `?` to match a single character
    /// - Exact matches for literal strings
    pub fn match_pattern(&self, pattern: &str, token: &str) -> bool {
        self.match_recursive(pattern.as_bytes(), token.as_bytes())
    }

    #[allow(clippy::only_used_in_recursion)]
    fn match_recursive(&self, pattern: &[u8], token: &[u8]) -> bool {
        match (pattern.first(), token.first()) {
            (None, None) => true,
            (None, Some(_)) => false,
            // Trailing wildcards match the empty remainder
            (Some(&b'*'), None) => self.match_recursive(&pattern[1..], token),
            (Some(_), None) => false,
            (Some(&b'*'), Some(_)) => {
                self.match_recursive(&pattern[1..], token)
                    || self.match_recursive(pattern, &token[1..])
            }
            (Some(&b'?'), Some(_)) => self.match_recursive(&pattern[1..], &token[1..]),
            (Some(&p), Some(&t)) if p == t => self.match_recursive(&pattern[1..], &token[1..]),
            _ => false,
        }
    }

    /// Validate a grant pattern
    pub fn validate_pattern(&self, pattern: &str) -> Result<()> {
        if pattern.trim().is_empty() {
            return Err(Error::InvalidGrantPattern(
                "Pattern cannot be empty".to_string(),
            ));
        }

        if pattern.contains(',') {
            return Err(Error::InvalidGrantPattern(format!(
                "Grant '{}' must name a single permission, not a list",
                pattern
            )));
        }

        if pattern.chars().any(char::is_whitespace) {
            return Err(Error::InvalidGrantPattern(format!(
                "Grant '{}' contains whitespace",
                pattern
            )));
        }

        Ok(())
    }

    /// Check whether a pattern contains wildcard characters
    pub fn is_wildcard(&self, pattern: &str) -> bool {
        pattern.contains('*') || pattern.contains('?')
    }
}
