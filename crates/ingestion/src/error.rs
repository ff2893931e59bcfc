//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Source parameter could not be parsed
    #[error("invalid source parameter '{key}': {message}")]
    InvalidParam {
        /// Parameter key
        key: String,
        /// Error message
        message: String,
    },

    /// No probes configured for the source
    #[error("source '{source_name}' has no probes configured")]
    NoProbes {
        /// Source name
        source_name: String,
    },
}

impl IngestionError {
    pub fn invalid_param(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParam {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result alias
pub type Result<T> = std::result::Result<T, IngestionError>;
