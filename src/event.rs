//! Notifications delivered by the client actor

use bytes::Bytes;
use relink_core::{CloseReason, Endpoint, FailureReason, PeerInfo};

/// One [`ClientHandler`](relink_core::ClientHandler) callback, as a value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Opened { peer: PeerInfo },
    ReconnectStarted { target: Endpoint },
    Closed { peer: PeerInfo, reason: CloseReason },
    AttemptFailed { peer: PeerInfo, reason: FailureReason },
    Received { data: Bytes },
}

impl ClientEvent {
    /// No retry follows this event.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::AttemptFailed { .. })
    }
}
