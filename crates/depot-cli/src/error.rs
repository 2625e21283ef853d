//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use depot_core::CoreError;
use depot_proxy::ProxyError;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    #[diagnostic(code(depot::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Path or coordinate could not be translated
    #[error("Layout error: {message}")]
    #[diagnostic(code(depot::cli::layout))]
    Layout { message: String },

    /// Nothing to return for the request
    #[error("Not found: {what}")]
    #[diagnostic(code(depot::cli::not_found))]
    NotFound { what: String },

    /// A file disagrees with its checksum sidecar
    #[error("Checksum verification failed: {message}")]
    #[diagnostic(code(depot::cli::checksum))]
    Checksum { message: String },

    /// Invalid arguments
    #[error("{message}")]
    #[diagnostic(code(depot::cli::usage))]
    Usage { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(depot::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(depot::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Layout { .. } => exit_codes::LAYOUT_ERROR,
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::Checksum { .. } => exit_codes::CHECKSUM_ERROR,
            CliError::Usage { .. } => exit_codes::USAGE_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    /// Create a configuration error with help text
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<depot_core::LayoutError> for CliError {
    fn from(err: depot_core::LayoutError) -> Self {
        CliError::Layout {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Layout(_) | CoreError::UnknownLayout { .. } => CliError::Layout { message },
            CoreError::MetadataParse { .. } | CoreError::MetadataSerialize { .. } => {
                CliError::Internal { message }
            }
        }
    }
}

impl From<ProxyError> for CliError {
    fn from(err: ProxyError) -> Self {
        let message = err.to_string();
        match err {
            ProxyError::RepositoryNotFound { .. }
            | ProxyError::InvalidConfig { .. }
            | ProxyError::InvalidRepositoryUrl { .. }
            | ProxyError::Serialization(_) => CliError::Config {
                message,
                help: None,
            },
            ProxyError::Layout(_) => CliError::Layout { message },
            ProxyError::Core(err) => CliError::from(err),
            ProxyError::ChecksumMismatch { .. } => CliError::Checksum { message },
            ProxyError::Io(_) => CliError::Io { message },
            ProxyError::TransferFailed { .. } | ProxyError::Timeout { .. } => {
                CliError::Internal { message }
            }
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let missing = ProxyError::RepositoryNotFound {
            id: "internal".to_string(),
        };
        assert_eq!(CliError::from(missing).exit_code(), exit_codes::CONFIG_ERROR);

        let layout = depot_core::LayoutError::new("a/b", "too short");
        assert_eq!(CliError::from(layout).exit_code(), exit_codes::LAYOUT_ERROR);

        let parse = CoreError::MetadataParse {
            message: "unexpected end of document".to_string(),
        };
        assert_eq!(CliError::from(parse).exit_code(), exit_codes::ERROR);
        let wrapped = ProxyError::Core(CoreError::UnknownLayout {
            name: "maven1".to_string(),
        });
        assert_eq!(CliError::from(wrapped).exit_code(), exit_codes::LAYOUT_ERROR);

        assert_eq!(CliError::not_found("x").exit_code(), exit_codes::NOT_FOUND);
        assert_eq!(CliError::usage("x").exit_code(), exit_codes::USAGE_ERROR);
    }
}
