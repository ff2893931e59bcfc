//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Only sink construction can fail; delivery errors stay inside the sink
/// worker as `ContractError`s.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink parameter error
    #[error("invalid parameter '{key}' for sink '{name}': {message}")]
    InvalidParam {
        name: String,
        key: String,
        message: String,
    },
}

impl DispatcherError {
    /// Create a parameter error
    pub fn invalid_param(
        name: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParam {
            name: name.into(),
            key: key.into(),
            message: message.into(),
        }
    }
}
