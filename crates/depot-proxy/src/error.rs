//! Error types for proxy operations
//!
//! Only configuration, layout and local filesystem problems reach the
//! caller of a fetch. Transfer failures and checksum mismatches are
//! recovered per connector and end up in the logs.

use thiserror::Error;

/// Proxy operation errors
#[derive(Debug, Error)]
pub enum ProxyError {
    // ============ Configuration Errors ============
    #[error("Repository not found: {id}")]
    RepositoryNotFound { id: String },

    #[error("Invalid proxy configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Invalid repository URL: {url} - {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    // ============ Request Errors ============
    #[error(transparent)]
    Layout(#[from] depot_core::LayoutError),

    #[error(transparent)]
    Core(#[from] depot_core::CoreError),

    // ============ Remote Errors (recovered per connector) ============
    #[error("Transfer of {url} failed: {reason}")]
    TransferFailed { url: String, reason: String },

    #[error("Transfer of {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("Checksum mismatch for {path}: {algorithm} expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        algorithm: String,
        expected: String,
        actual: String,
    },

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for proxy operations
pub type Result<T> = std::result::Result<T, ProxyError>;

impl From<serde_yaml::Error> for ProxyError {
    fn from(e: serde_yaml::Error) -> Self {
        ProxyError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        let url = e.url().map(|u| u.to_string()).unwrap_or_default();
        if e.is_timeout() {
            ProxyError::Timeout { url, seconds: 0 }
        } else if e.is_connect() {
            ProxyError::TransferFailed {
                url,
                reason: format!("Connection failed: {}", e),
            }
        } else {
            ProxyError::TransferFailed {
                url,
                reason: e.to_string(),
            }
        }
    }
}
