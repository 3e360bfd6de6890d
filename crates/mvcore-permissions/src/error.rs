//! Error types for the permissions crate

use thiserror::Error;

/// Result type for permissions operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or validating grants
///
/// Permission expressions themselves never fail to parse; these errors only
/// cover the grant table and its configuration file.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid grant pattern: {0}")]
    InvalidGrantPattern(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
