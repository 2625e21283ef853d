//! Error types for core operations

use thiserror::Error;

/// A repository path that does not decode under a layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid path '{path}': {reason}")]
pub struct LayoutError {
    pub path: String,
    pub reason: String,
}

impl LayoutError {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Core errors
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("Unknown repository layout: {name}")]
    UnknownLayout { name: String },

    #[error("Metadata parse error: {message}")]
    MetadataParse { message: String },

    #[error("Metadata serialization error: {message}")]
    MetadataSerialize { message: String },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl From<quick_xml::DeError> for CoreError {
    fn from(e: quick_xml::DeError) -> Self {
        CoreError::MetadataParse {
            message: e.to_string(),
        }
    }
}

impl From<quick_xml::SeError> for CoreError {
    fn from(e: quick_xml::SeError) -> Self {
        CoreError::MetadataSerialize {
            message: e.to_string(),
        }
    }
}
