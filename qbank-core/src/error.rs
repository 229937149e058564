//! Error types for export operations

use std::fmt;

/// Errors that can occur while serializing or writing an export document
#[derive(Debug, Clone, PartialEq)]
pub enum ExportError {
    /// Export format not found in registry
    FormatNotFound(String),
    /// Error during serialization
    SerializationError(String),
    /// An image could not be fetched for inlining
    ImageFetch { url: String, reason: String },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::FormatNotFound(name) => write!(f, "Export format '{name}' not found"),
            ExportError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            ExportError::ImageFetch { url, reason } => {
                write!(f, "Failed to fetch image '{url}': {reason}")
            }
        }
    }
}

impl std::error::Error for ExportError {}
