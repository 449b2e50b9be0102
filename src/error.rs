//! Error types for machina
//!
//! Every failure the command layer can raise is a variant of [`MachinaError`].
//! None of them are retried; they propagate to the top-level dispatcher.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for command dispatch and target resolution
#[derive(Error, Debug)]
pub enum MachinaError {
    /// A dotted-quad address or mask did not parse
    #[error("Invalid IPv4 address format: '{value}'")]
    InvalidFormat { value: String },

    /// The option parser rejected a token
    #[error("Invalid options: {message}")]
    InvalidOptions { message: String },

    /// Target resolution was attempted outside a project
    #[error(
        "A Machinefile is required to run this command. Run this command from a \
         directory containing a Machinefile, or from one of its subdirectories."
    )]
    NoEnvironment,

    /// A (name, provider) pair had no machine behind it
    #[error("The machine '{name}' was not found in this environment.")]
    MachineNotFound { name: String },

    /// An explicit provider request conflicts with the provider a machine is active under
    #[error(
        "The machine '{name}' is already active under the '{active_provider}' provider, \
         but '{requested_provider}' was requested. Destroy the machine first or run \
         the command with '--provider {active_provider}'."
    )]
    ActiveMachineWithDifferentProvider {
        name: String,
        active_provider: String,
        requested_provider: String,
    },

    /// Errors related to the project manifest or process configuration
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// File system operation errors
    #[error("File system error: {operation} failed on {path}")]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MachinaError {
    /// Create a new invalid address format error
    pub fn invalid_format(value: impl Into<String>) -> Self {
        Self::InvalidFormat {
            value: value.into(),
        }
    }

    /// Create a new invalid options error
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Create a new machine not found error
    pub fn machine_not_found(name: impl Into<String>) -> Self {
        Self::MachineNotFound { name: name.into() }
    }

    /// Create a new provider conflict error
    pub fn active_machine_with_different_provider(
        name: impl Into<String>,
        active_provider: impl Into<String>,
        requested_provider: impl Into<String>,
    ) -> Self {
        Self::ActiveMachineWithDifferentProvider {
            name: name.into(),
            active_provider: active_provider.into(),
            requested_provider: requested_provider.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new configuration error wrapping its cause
    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new file system error
    pub fn file_system<P: Into<PathBuf>>(
        operation: impl Into<String>,
        path: P,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MachinaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_conflict_message_names_everything() {
        let err = MachinaError::active_machine_with_different_provider("web", "docker", "virtualbox");
        let message = err.to_string();
        assert!(message.contains("'web'"));
        assert!(message.contains("'docker'"));
        assert!(message.contains("'virtualbox'"));
    }

    #[test]
    fn test_config_with_source_keeps_chain() {
        let io = std::io::Error::other("boom");
        let err = MachinaError::config_with_source("bad manifest", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
