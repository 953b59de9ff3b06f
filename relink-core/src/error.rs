//! Error types for the relink core state machine

use std::fmt;

/// Result type for relink core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors produced by the core.
///
/// Most failures of the connection contract are reported through sentinel
/// values or hooks, so this stays small: only the two things the core can
/// reject outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid client configuration
    Config { message: String },
    /// Inbound bytes that do not form a frame
    Frame { message: String },
}

impl CoreError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CoreError::Config {
            message: message.into(),
        }
    }

    /// Create a frame error
    pub fn frame(message: impl Into<String>) -> Self {
        CoreError::Frame {
            message: message.into(),
        }
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::Config { message } => write!(f, "Configuration error: {message}"),
            CoreError::Frame { message } => write!(f, "Frame error: {message}"),
        }
    }
}

impl std::error::Error for CoreError {}
