//! Connection state, lifecycle, send path and peer metrics

use crate::config::ClientConfig;
use crate::error::CoreResult;
use crate::handler::{ClientHandler, Decompressor};
use crate::policy::{ReconnectPolicy, RetryDecision};
use crate::protocol::{constants, encode_frame};
use crate::timer::{TimerHandle, TimerQueue};
use crate::transport::Transport;
use crate::types::{
    AttemptOutcome, CloseReason, ConnectResult, Endpoint, PacketPriority, PacketReliability,
    PeerInfo, Phase, PingStats, SendTarget,
};

use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Returned by the send path when there is no transport to send through
pub const SEND_FAILED: i32 = -1;

/// Returned by the ping accessors when no peer is known
pub const NO_PING: i32 = -1;

/// Work deferred to a later poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerAction {
    Reconnect,
}

/// Client-side manager of a single logical connection.
///
/// The client owns the transport and the application's [`ClientHandler`].
/// Nothing happens on its own: the host calls [`poll`](Client::poll) from its
/// scheduler, and every event, retry and hook runs inside that call.
pub struct Client<T: Transport, H: ClientHandler> {
    pub(crate) transport: Option<T>,
    pub(crate) handler: H,
    pub(crate) config: ClientConfig,

    // Connection state
    pub(crate) target: Option<Endpoint>,
    pub(crate) closed_by_user: bool,
    pub(crate) policy: ReconnectPolicy,

    // Deferred work
    pub(crate) timers: TimerQueue<TimerAction>,
    pub(crate) reconnect_timer: Option<TimerHandle>,

    pub(crate) decompressor: Option<Box<dyn Decompressor>>,
}

impl<T: Transport, H: ClientHandler> Client<T, H> {
    /// Create a client. The transport is not started until the first connect.
    pub fn new(transport: T, handler: H, config: ClientConfig) -> CoreResult<Self> {
        config.validate()?;

        let policy = ReconnectPolicy::new(config.reconnect_try_count, config.reconnect_interval);
        Ok(Self {
            transport: Some(transport),
            handler,
            config,
            target: None,
            closed_by_user: false,
            policy,
            timers: TimerQueue::new(),
            reconnect_timer: None,
            decompressor: None,
        })
    }

    /// Install an inflate step for inbound compressed frames.
    pub fn with_decompressor(mut self, decompressor: Box<dyn Decompressor>) -> Self {
        self.decompressor = Some(decompressor);
        self
    }

    /// Connect to `host:port`, remembering it as the reconnect target and
    /// refilling the retry budget.
    pub fn connect(&mut self, host: impl Into<String>, port: u16) -> AttemptOutcome {
        self.target = Some(Endpoint::new(host, port));
        self.policy.reset();
        self.connect_target()
    }

    /// Start the transport if needed and begin an attempt against the stored
    /// target.
    pub(crate) fn connect_target(&mut self) -> AttemptOutcome {
        self.closed_by_user = false;

        let Some(target) = self.target.clone() else {
            error!("Connect requested without a target");
            return AttemptOutcome::InvalidParameter;
        };

        let Some(transport) = self.transport.as_mut() else {
            error!(host = %target.host, port = target.port, "Connect failed, transport released");
            return AttemptOutcome::InvalidInterfaceInstance;
        };

        if !transport.is_active() {
            info!(thread_priority = self.config.thread_priority, "Transport startup");

            let result = transport.start(self.config.thread_priority);
            if !result.is_running() {
                error!(
                    result = ?result,
                    host = %target.host,
                    port = target.port,
                    "Transport startup failed"
                );
                return AttemptOutcome::ConnectionStartupFailed;
            }

            transport.set_occasional_ping(true);
            info!("Transport started");
        }

        let result = transport.connect(&target.host, target.port, None);
        match result {
            ConnectResult::AttemptStarted => {
                info!(host = %target.host, port = target.port, "Connection attempt started");
            }
            ConnectResult::AlreadyConnected => {
                warn!(host = %target.host, port = target.port, "Already connected");
            }
            ConnectResult::AttemptInProgress => {
                info!(host = %target.host, port = target.port, "Connection attempt already in progress");
            }
            ConnectResult::Unknown(code) => {
                error!(code, host = %target.host, port = target.port, "Connect failed, unknown error");
            }
            other => {
                error!(result = ?other, host = %target.host, port = target.port, "Connect failed");
            }
        }
        result.into()
    }

    /// Close every known peer gracefully and stop reconnecting.
    ///
    /// Each peer is reported through `on_connection_closed` with
    /// [`CloseReason::ClosedByUser`] before the transport closes it.
    pub fn disconnect(&mut self) {
        self.cancel_reconnect();
        self.closed_by_user = true;

        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        for peer in transport.peer_list() {
            info!(host = %peer.addr.host, port = peer.addr.port, peer = %peer.id, "Connection closed by user");
            self.handler
                .on_connection_closed(&peer, CloseReason::ClosedByUser);
            transport.close_peer(peer.id, true);
        }
    }

    /// Phase of the first known peer, `NotConnected` without one.
    pub fn state(&self) -> Phase {
        match (self.transport.as_ref(), self.first_peer()) {
            (Some(transport), Some(peer)) => transport.peer_state(peer.id),
            _ => Phase::NotConnected,
        }
    }

    /// Whether the transport session is started.
    pub fn is_active(&self) -> bool {
        self.transport
            .as_ref()
            .map(|t| t.is_active())
            .unwrap_or(false)
    }

    /// Set the peer timeout on the transport.
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        if let Some(transport) = self.transport.as_mut() {
            transport.set_timeout(timeout_ms, SendTarget::Broadcast);
        }
    }

    /// Ping statistics of the first known peer.
    pub fn ping_stats(&self) -> Option<PingStats> {
        let transport = self.transport.as_ref()?;
        let peer = self.first_peer()?;
        Some(transport.ping_stats(peer.id))
    }

    /// Average round-trip time in ms, or [`NO_PING`] without a peer.
    pub fn average_ping(&self) -> i32 {
        self.ping_stats().map(|s| s.average).unwrap_or(NO_PING)
    }

    /// Most recent round-trip time in ms, or [`NO_PING`] without a peer.
    pub fn last_ping(&self) -> i32 {
        self.ping_stats().map(|s| s.last).unwrap_or(NO_PING)
    }

    /// Lowest round-trip time in ms, or [`NO_PING`] without a peer.
    pub fn lowest_ping(&self) -> i32 {
        self.ping_stats().map(|s| s.lowest).unwrap_or(NO_PING)
    }

    /// Send `data` on `channel` with the configured priority and reliability.
    pub fn send(&mut self, data: &[u8], channel: u8) -> i32 {
        self.send_with_option(
            data,
            channel,
            self.config.default_priority,
            self.config.default_reliability,
        )
    }

    /// Send `data` as an application frame.
    ///
    /// Returns whatever the transport returns, [`SEND_FAILED`] if the
    /// transport is gone. The frame is queued even before a connection is
    /// open; the transport decides its fate.
    pub fn send_with_option(
        &mut self,
        data: &[u8],
        channel: u8,
        priority: PacketPriority,
        reliability: PacketReliability,
    ) -> i32 {
        self.send_frame(
            constants::MSG_APPLICATION_DATA,
            data,
            false,
            channel,
            priority,
            reliability,
        )
    }

    fn send_frame(
        &mut self,
        kind: u8,
        data: &[u8],
        compress: bool,
        channel: u8,
        priority: PacketPriority,
        reliability: PacketReliability,
    ) -> i32 {
        let Some(transport) = self.transport.as_mut() else {
            warn!(bytes = data.len(), channel, "Send dropped, transport released");
            return SEND_FAILED;
        };

        let frame = encode_frame(kind, compress, data);
        let result = transport.send(&frame, priority, reliability, channel, SendTarget::Broadcast);
        debug!(bytes = data.len(), channel, result, "Frame queued");
        result
    }

    /// Shut the transport down and release it. Safe to call repeatedly; also
    /// runs on drop.
    pub fn shutdown(&mut self) {
        self.cancel_reconnect();
        self.timers.clear();

        if let Some(mut transport) = self.transport.take() {
            info!(drain_delay_ms = self.config.shutdown_delay_ms, "Transport shutdown");
            transport.shutdown(self.config.shutdown_delay_ms);
            drop(transport);
            info!("Transport released");
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// The transport, `None` after shutdown.
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn target(&self) -> Option<&Endpoint> {
        self.target.as_ref()
    }

    /// Retries left before failures are reported.
    pub fn reconnect_budget(&self) -> u32 {
        self.policy.remaining()
    }

    pub fn is_closed_by_user(&self) -> bool {
        self.closed_by_user
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.reconnect_timer
            .is_some_and(|handle| self.timers.is_pending(handle))
    }

    /// Deadline of the next scheduled retry, if any.
    pub fn next_reconnect_at(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// First peer of the transport's list: the connection this client manages.
    pub(crate) fn first_peer(&self) -> Option<PeerInfo> {
        self.transport
            .as_ref()
            .and_then(|t| t.peer_list().into_iter().next())
    }

    /// Charge the budget for a failure and schedule a retry, or report that
    /// the caller should surface the failure.
    pub(crate) fn try_schedule_reconnect(&mut self, now: Instant) -> Option<Duration> {
        match self.policy.on_failure(self.closed_by_user) {
            RetryDecision::Retry { delay, remaining } => {
                self.cancel_reconnect();
                self.reconnect_timer = Some(self.timers.schedule(now, delay, TimerAction::Reconnect));
                debug!(delay_ms = delay.as_millis() as u64, remaining, "Reconnect scheduled");
                Some(delay)
            }
            RetryDecision::GiveUp => None,
        }
    }

    pub(crate) fn cancel_reconnect(&mut self) {
        if let Some(handle) = self.reconnect_timer.take() {
            self.timers.cancel(handle);
        }
    }
}

impl<T: Transport, H: ClientHandler> Drop for Client<T, H> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingHandler, ScriptedTransport};
    use crate::types::{PeerId, StartupResult};

    fn client() -> (Client<ScriptedTransport, RecordingHandler>, crate::testing::ScriptHandle) {
        let transport = ScriptedTransport::new();
        let script = transport.handle();
        let client = Client::new(transport, RecordingHandler::default(), ClientConfig::default())
            .unwrap();
        (client, script)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Client::new(
            ScriptedTransport::new(),
            RecordingHandler::default(),
            ClientConfig::new().timeout_ms(0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_connect_starts_transport_once() {
        let (mut client, script) = client();
        assert!(!client.is_active());

        assert_eq!(client.connect("game.local", 7777), AttemptOutcome::AttemptStarted);
        assert!(client.is_active());
        assert_eq!(script.start_calls(), 1);
        assert!(script.occasional_ping());

        client.connect("game.local", 7777);
        assert_eq!(script.start_calls(), 1);
        assert_eq!(script.connect_calls().len(), 2);
    }

    #[test]
    fn test_startup_failure_is_terminal_outcome() {
        let (mut client, script) = client();
        script.set_startup_result(StartupResult::Failed(5));

        assert_eq!(
            client.connect("game.local", 7777),
            AttemptOutcome::ConnectionStartupFailed
        );
        assert!(script.connect_calls().is_empty());
        assert!(!client.has_pending_reconnect());
    }

    #[test]
    fn test_already_connected_is_not_an_error() {
        let (mut client, script) = client();
        script.set_connect_result(ConnectResult::AlreadyConnected);
        assert_eq!(
            client.connect("game.local", 7777),
            AttemptOutcome::AlreadyConnectedToEndpoint
        );
    }

    #[test]
    fn test_state_without_peers() {
        let (client, _) = client();
        assert_eq!(client.state(), Phase::NotConnected);
    }

    #[test]
    fn test_state_follows_first_peer() {
        let (client, script) = client();
        script.add_peer(PeerInfo::new(Endpoint::new("a", 1), PeerId(1)), Phase::Connecting);
        script.add_peer(PeerInfo::new(Endpoint::new("b", 2), PeerId(2)), Phase::Connected);
        assert_eq!(client.state(), Phase::Connecting);
    }

    #[test]
    fn test_ping_sentinel_and_values() {
        let (client, script) = client();
        assert_eq!(client.average_ping(), NO_PING);
        assert_eq!(client.last_ping(), NO_PING);
        assert_eq!(client.lowest_ping(), NO_PING);
        assert_eq!(client.ping_stats(), None);

        let peer = PeerInfo::new(Endpoint::new("a", 1), PeerId(9));
        script.add_peer(peer, Phase::Connected);
        script.set_ping(
            PeerId(9),
            PingStats {
                average: 40,
                last: 35,
                lowest: 20,
            },
        );
        assert_eq!(client.average_ping(), 40);
        assert_eq!(client.last_ping(), 35);
        assert_eq!(client.lowest_ping(), 20);
    }

    #[test]
    fn test_send_uses_defaults() {
        let (mut client, script) = client();
        let result = client.send(b"abc", 2);
        assert_eq!(result, 5);

        let sent = script.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(&sent[0].frame[..], &[constants::MSG_APPLICATION_DATA, 0, b'a', b'b', b'c']);
        assert_eq!(sent[0].channel, 2);
        assert_eq!(sent[0].priority, PacketPriority::Immediate);
        assert_eq!(sent[0].reliability, PacketReliability::ReliableOrdered);
        assert_eq!(sent[0].target, SendTarget::Broadcast);
    }

    #[test]
    fn test_absent_transport_sentinels() {
        let (mut client, script) = client();
        client.shutdown();

        assert_eq!(client.send(b"x", 0), SEND_FAILED);
        assert_eq!(client.connect("a", 1), AttemptOutcome::InvalidInterfaceInstance);
        assert_eq!(client.state(), Phase::NotConnected);
        assert_eq!(client.average_ping(), NO_PING);
        assert!(!client.is_active());
        client.disconnect();
        client.set_timeout(100);
        assert_eq!(script.shutdown_calls(), vec![500]);
    }

    #[test]
    fn test_shutdown_is_idempotent_and_runs_on_drop() {
        let (mut client, script) = client();
        client.shutdown();
        client.shutdown();
        drop(client);
        assert_eq!(script.shutdown_calls().len(), 1);

        let (client, script) = self::client();
        drop(client);
        assert_eq!(script.shutdown_calls(), vec![500]);
    }
}
