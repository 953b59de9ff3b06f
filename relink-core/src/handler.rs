//! Application hooks
//!
//! A [`ClientHandler`] receives the notifications a client raises while it
//! polls. Every method has a no-op default, so an application only overrides
//! what it cares about. Hooks run inside `Client::poll` and cannot call back
//! into the client.

use crate::types::{CloseReason, Endpoint, FailureReason, PeerInfo};
use bytes::Bytes;

pub trait ClientHandler {
    /// The handshake with `peer` completed. The client has already refilled
    /// its reconnect budget and applied the configured timeout.
    fn on_connection_opened(&mut self, _peer: &PeerInfo) {}

    /// A scheduled retry is about to connect to `target`.
    fn on_reconnect_started(&mut self, _target: &Endpoint) {}

    /// The connection ended and will not be retried.
    fn on_connection_closed(&mut self, _peer: &PeerInfo, _reason: CloseReason) {}

    /// A connection attempt failed and will not be retried.
    fn on_connection_attempt_failed(&mut self, _peer: &PeerInfo, _reason: FailureReason) {}

    /// Application payload from the peer, frame header removed.
    fn on_received(&mut self, _data: Bytes) {}
}

/// Handler that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl ClientHandler for NoopHandler {}

/// Optional inflate step for inbound frames flagged as compressed.
///
/// Outbound frames are never compressed.
pub trait Decompressor: Send {
    /// Inflate `input`, `None` if it is not valid compressed data.
    fn decompress(&mut self, input: &[u8]) -> Option<Bytes>;
}
