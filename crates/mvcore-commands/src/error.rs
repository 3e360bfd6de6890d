use thiserror::Error;

/// Errors that can occur in the commands system
///
/// A missing pending confirmation is not an error; it is reported through
/// [`DispatchOutcome::NothingToConfirm`](crate::DispatchOutcome::NothingToConfirm).
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Invalid command name: {0}")]
    InvalidCommandName(String),

    #[error("Permission denied for command: {command}")]
    PermissionDenied { command: String },

    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CommandError>;
