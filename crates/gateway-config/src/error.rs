//! Configuration loading errors.

use gateway_core::GatewayError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading settings documents
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The document did not parse
    #[error("Failed to parse {format} settings: {message}")]
    Parse {
        /// Document format
        format: &'static str,
        /// Parser message
        message: String,
    },

    /// Field-level validation failed
    #[error("Invalid settings: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A `${VAR}` placeholder named an unset variable
    #[error("Environment variable {var} is not set")]
    MissingEnv {
        /// Variable name
        var: String,
    },

    /// A value was well-formed but unusable
    #[error("Invalid settings: {message}")]
    Invalid {
        /// Description of the problem
        message: String,
    },
}

impl ConfigError {
    /// Create an invalid-settings error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<ConfigError> for GatewayError {
    fn from(error: ConfigError) -> Self {
        Self::configuration(error.to_string())
    }
}

impl From<GatewayError> for ConfigError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::Configuration { message } => Self::Invalid { message },
            other => Self::invalid(other.to_string()),
        }
    }
}
