//! Error types for relink.
//!
//! [`RelinkError`] extends [`relink_core::CoreError`] with the failures of
//! the async handle: a stopped actor, a rejected connect, a refused send.

use relink_core::AttemptOutcome;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelinkError>;

// ── Error types ─────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelinkError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Frame error: {message}")]
    Frame { message: String },

    #[error("Connection error: {kind}")]
    Connection { kind: ConnectionError },

    #[error("Send failed on channel {channel}")]
    Send { channel: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// The client actor has stopped
    Closed,
    /// The attempt could not start
    Rejected(AttemptOutcome),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "client closed"),
            Self::Rejected(outcome) => write!(f, "connect rejected: {outcome:?}"),
        }
    }
}

// ── Bridge: relink-core errors → RelinkError ────────────────────────────

impl From<relink_core::CoreError> for RelinkError {
    fn from(e: relink_core::CoreError) -> Self {
        match e {
            relink_core::CoreError::Config { message } => Self::Config { message },
            relink_core::CoreError::Frame { message } => Self::Frame { message },
        }
    }
}

// ── Constructors ────────────────────────────────────────────────────────

impl RelinkError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn connection(kind: ConnectionError) -> Self {
        Self::Connection { kind }
    }

    pub fn closed() -> Self {
        Self::connection(ConnectionError::Closed)
    }

    pub fn rejected(outcome: AttemptOutcome) -> Self {
        Self::connection(ConnectionError::Rejected(outcome))
    }

    pub fn send(channel: u8) -> Self {
        Self::Send { channel }
    }
}

// ── Predicates ──────────────────────────────────────────────────────────

impl RelinkError {
    /// Worth trying again later with the same client
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Send { .. } => true,
            Self::Connection {
                kind: ConnectionError::Rejected(outcome),
            } => matches!(
                outcome,
                AttemptOutcome::CannotResolveDomainName | AttemptOutcome::UnknownError
            ),
            _ => false,
        }
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// The client can no longer make progress
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Connection {
                kind: ConnectionError::Closed
                    | ConnectionError::Rejected(
                        AttemptOutcome::ConnectionStartupFailed
                            | AttemptOutcome::InvalidInterfaceInstance
                    )
            }
        )
    }

    pub fn is_closed(&self) -> bool {
        matches!(
            self,
            Self::Connection {
                kind: ConnectionError::Closed
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_bridge() {
        let e: RelinkError = relink_core::CoreError::config("bad").into();
        assert_eq!(e, RelinkError::config("bad"));
        assert_eq!(e.to_string(), "Configuration error: bad");

        let e: RelinkError = relink_core::CoreError::frame("short").into();
        assert!(matches!(e, RelinkError::Frame { .. }));
    }

    #[test]
    fn test_predicates() {
        assert!(RelinkError::closed().is_closed());
        assert!(RelinkError::closed().is_fatal());
        assert!(RelinkError::send(3).is_recoverable());
        assert!(RelinkError::rejected(AttemptOutcome::CannotResolveDomainName).is_recoverable());
        assert!(RelinkError::rejected(AttemptOutcome::ConnectionStartupFailed).is_fatal());
        assert!(!RelinkError::rejected(AttemptOutcome::InvalidParameter).is_fatal());
        assert!(!RelinkError::config("x").is_connection_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            RelinkError::closed().to_string(),
            "Connection error: client closed"
        );
        assert_eq!(
            RelinkError::send(2).to_string(),
            "Send failed on channel 2"
        );
    }
}
