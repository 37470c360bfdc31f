//! Configuration error types.

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found")]
    DirNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns a user-friendly message suitable for display in the UI.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::DirNotFound => "Could not locate a configuration directory.",
            ConfigError::Io(_) => "A configuration file operation failed.",
            ConfigError::ParseError(_) => "The configuration file could not be read.",
            ConfigError::Invalid(_) => "The configuration contains invalid settings.",
        }
    }
}
