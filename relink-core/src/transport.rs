//! The transport collaborator seen from the client
//!
//! The [`Transport`] trait is everything the client needs from a lower-level
//! peer engine (handshakes, retransmission, congestion control are its
//! business). Calls are synchronous and must not block; results arrive later
//! as [`TransportEvent`]s drained through [`Transport::poll_next_event`].

use crate::types::{
    ConnectResult, PacketPriority, PacketReliability, Phase, PeerId, PeerInfo, PingStats,
    SendTarget, StartupResult,
};
use bytes::Bytes;

/// A message drained from the transport's receive queue.
///
/// `data` is the raw message: its first byte is the message kind, followed by
/// the kind-specific body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub peer: PeerInfo,
    pub data: Bytes,
}

impl TransportEvent {
    pub fn new(peer: PeerInfo, data: Bytes) -> Self {
        Self { peer, data }
    }

    /// Leading message kind, `None` for an empty message
    pub fn kind(&self) -> Option<u8> {
        self.data.first().copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Poll-based peer engine driven by [`Client`](crate::Client).
///
/// The client calls this from one thread only. Implementations that run their
/// own socket threads must make [`poll_next_event`](Transport::poll_next_event)
/// safe to drain from that caller.
pub trait Transport: Send + 'static {
    /// Start the session. `thread_priority` is passed to the I/O thread.
    fn start(&mut self, thread_priority: i32) -> StartupResult;

    /// Whether the session is started
    fn is_active(&self) -> bool;

    /// Enable or disable periodic pings to connected peers
    fn set_occasional_ping(&mut self, enabled: bool);

    /// Begin a connection attempt; the outcome arrives as an event.
    fn connect(&mut self, host: &str, port: u16, password: Option<&[u8]>) -> ConnectResult;

    /// Next queued event, `None` when the queue is empty.
    fn poll_next_event(&mut self) -> Option<TransportEvent>;

    /// Hand a processed event back so pooled buffers can be reused.
    fn release_event(&mut self, event: TransportEvent) {
        drop(event);
    }

    /// Queue `frame` for delivery. Returns the transport's byte count or
    /// queue index, 0 or negative on failure.
    fn send(
        &mut self,
        frame: &[u8],
        priority: PacketPriority,
        reliability: PacketReliability,
        channel: u8,
        target: SendTarget,
    ) -> i32;

    /// Known peers, in the transport's order
    fn peer_list(&self) -> Vec<PeerInfo>;

    fn peer_state(&self, peer: PeerId) -> Phase;

    fn ping_stats(&self, peer: PeerId) -> PingStats;

    /// Silence period after which a peer is considered lost
    fn set_timeout(&mut self, timeout_ms: u32, target: SendTarget);

    /// Close a peer's connection, optionally after queued sends go out.
    fn close_peer(&mut self, peer: PeerId, flush_remaining: bool);

    /// Stop the session, waiting up to `drain_delay_ms` for queued data.
    fn shutdown(&mut self, drain_delay_ms: u32);
}
