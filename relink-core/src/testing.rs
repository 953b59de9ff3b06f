//! In-memory transport and recording handler
//!
//! [`ScriptedTransport`] plays the part of a peer engine: tests queue events
//! through a [`ScriptHandle`] and inspect what the client asked of it. The
//! handle is cloneable and survives the transport being moved into a client.

use crate::handler::ClientHandler;
use crate::protocol::{constants, encode_frame};
use crate::transport::{Transport, TransportEvent};
use crate::types::{
    CloseReason, ConnectResult, Endpoint, FailureReason, PacketPriority, PacketReliability,
    PeerId, PeerInfo, Phase, PingStats, SendTarget, StartupResult,
};

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A frame handed to [`Transport::send`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub frame: Bytes,
    pub priority: PacketPriority,
    pub reliability: PacketReliability,
    pub channel: u8,
    pub target: SendTarget,
}

#[derive(Debug)]
struct Script {
    active: bool,
    occasional_ping: bool,
    startup_result: StartupResult,
    connect_result: ConnectResult,
    send_result: Option<i32>,

    events: VecDeque<TransportEvent>,
    peers: Vec<(PeerInfo, Phase)>,
    pings: HashMap<PeerId, PingStats>,

    start_calls: usize,
    connect_calls: Vec<Endpoint>,
    sent: Vec<SentFrame>,
    timeouts: Vec<(u32, SendTarget)>,
    closed: Vec<(PeerId, bool)>,
    shutdown_calls: Vec<u32>,
    released: usize,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            active: false,
            occasional_ping: false,
            startup_result: StartupResult::Started,
            connect_result: ConnectResult::AttemptStarted,
            send_result: None,
            events: VecDeque::new(),
            peers: Vec::new(),
            pings: HashMap::new(),
            start_calls: 0,
            connect_calls: Vec::new(),
            sent: Vec::new(),
            timeouts: Vec::new(),
            closed: Vec::new(),
            shutdown_calls: Vec::new(),
            released: 0,
        }
    }
}

/// Shared view of a [`ScriptedTransport`]
#[derive(Debug, Clone, Default)]
pub struct ScriptHandle {
    inner: Arc<Mutex<Script>>,
}

impl ScriptHandle {
    fn lock(&self) -> MutexGuard<'_, Script> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Scripting

    pub fn set_startup_result(&self, result: StartupResult) {
        self.lock().startup_result = result;
    }

    pub fn set_connect_result(&self, result: ConnectResult) {
        self.lock().connect_result = result;
    }

    /// Override what `send` returns; by default it returns the frame length.
    pub fn set_send_result(&self, result: i32) {
        self.lock().send_result = Some(result);
    }

    pub fn set_ping(&self, peer: PeerId, stats: PingStats) {
        self.lock().pings.insert(peer, stats);
    }

    pub fn add_peer(&self, peer: PeerInfo, phase: Phase) {
        let mut script = self.lock();
        script.peers.retain(|(p, _)| p.id != peer.id);
        script.peers.push((peer, phase));
    }

    pub fn set_peer_state(&self, peer: PeerId, phase: Phase) {
        let mut script = self.lock();
        if let Some(entry) = script.peers.iter_mut().find(|(p, _)| p.id == peer) {
            entry.1 = phase;
        }
    }

    pub fn remove_peer(&self, peer: PeerId) {
        self.lock().peers.retain(|(p, _)| p.id != peer);
    }

    /// Queue a raw message.
    pub fn push_event(&self, peer: &PeerInfo, data: impl Into<Bytes>) {
        self.lock()
            .events
            .push_back(TransportEvent::new(peer.clone(), data.into()));
    }

    /// Complete a handshake: the peer becomes connected and the accepted
    /// notification is queued.
    pub fn accept(&self, peer: &PeerInfo) {
        self.add_peer(peer.clone(), Phase::Connected);
        self.push_event(peer, vec![constants::MSG_CONNECTION_REQUEST_ACCEPTED]);
    }

    /// Reject the pending attempt with a failure message of `kind`.
    pub fn fail_attempt(&self, addr: &Endpoint, kind: u8) {
        self.push_event(&PeerInfo::unassigned(addr.clone()), vec![kind]);
    }

    /// Drop the peer and queue a connection-lost notification.
    pub fn lose_connection(&self, peer: &PeerInfo) {
        self.remove_peer(peer.id);
        self.push_event(peer, vec![constants::MSG_CONNECTION_LOST]);
    }

    /// Drop the peer and queue a remote disconnection notification.
    pub fn remote_close(&self, peer: &PeerInfo) {
        self.remove_peer(peer.id);
        self.push_event(peer, vec![constants::MSG_DISCONNECTION_NOTIFICATION]);
    }

    /// Queue an uncompressed application frame.
    pub fn push_data(&self, peer: &PeerInfo, payload: &[u8]) {
        self.push_event(
            peer,
            encode_frame(constants::MSG_APPLICATION_DATA, false, payload),
        );
    }

    // Inspection

    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    pub fn occasional_ping(&self) -> bool {
        self.lock().occasional_ping
    }

    pub fn pending_events(&self) -> usize {
        self.lock().events.len()
    }

    pub fn start_calls(&self) -> usize {
        self.lock().start_calls
    }

    pub fn connect_calls(&self) -> Vec<Endpoint> {
        self.lock().connect_calls.clone()
    }

    pub fn sent_frames(&self) -> Vec<SentFrame> {
        self.lock().sent.clone()
    }

    pub fn timeouts(&self) -> Vec<(u32, SendTarget)> {
        self.lock().timeouts.clone()
    }

    pub fn closed_peers(&self) -> Vec<(PeerId, bool)> {
        self.lock().closed.clone()
    }

    pub fn shutdown_calls(&self) -> Vec<u32> {
        self.lock().shutdown_calls.clone()
    }

    pub fn released(&self) -> usize {
        self.lock().released
    }
}

/// Scripted [`Transport`] for tests and benchmarks
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: ScriptHandle,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> ScriptHandle {
        self.script.clone()
    }
}

impl Transport for ScriptedTransport {
    fn start(&mut self, _thread_priority: i32) -> StartupResult {
        let mut script = self.script.lock();
        script.start_calls += 1;
        let result = script.startup_result;
        if result.is_running() {
            script.active = true;
        }
        result
    }

    fn is_active(&self) -> bool {
        self.script.lock().active
    }

    fn set_occasional_ping(&mut self, enabled: bool) {
        self.script.lock().occasional_ping = enabled;
    }

    fn connect(&mut self, host: &str, port: u16, _password: Option<&[u8]>) -> ConnectResult {
        let mut script = self.script.lock();
        script.connect_calls.push(Endpoint::new(host, port));
        script.connect_result
    }

    fn poll_next_event(&mut self) -> Option<TransportEvent> {
        self.script.lock().events.pop_front()
    }

    fn release_event(&mut self, _event: TransportEvent) {
        self.script.lock().released += 1;
    }

    fn send(
        &mut self,
        data: &[u8],
        priority: PacketPriority,
        reliability: PacketReliability,
        channel: u8,
        target: SendTarget,
    ) -> i32 {
        let mut script = self.script.lock();
        script.sent.push(SentFrame {
            frame: Bytes::copy_from_slice(data),
            priority,
            reliability,
            channel,
            target,
        });
        script.send_result.unwrap_or(data.len() as i32)
    }

    fn peer_list(&self) -> Vec<PeerInfo> {
        self.script
            .lock()
            .peers
            .iter()
            .map(|(peer, _)| peer.clone())
            .collect()
    }

    fn peer_state(&self, peer: PeerId) -> Phase {
        self.script
            .lock()
            .peers
            .iter()
            .find(|(p, _)| p.id == peer)
            .map(|(_, phase)| *phase)
            .unwrap_or(Phase::NotConnected)
    }

    fn ping_stats(&self, peer: PeerId) -> PingStats {
        self.script
            .lock()
            .pings
            .get(&peer)
            .copied()
            .unwrap_or_default()
    }

    fn set_timeout(&mut self, timeout_ms: u32, target: SendTarget) {
        self.script.lock().timeouts.push((timeout_ms, target));
    }

    fn close_peer(&mut self, peer: PeerId, notify: bool) {
        let mut script = self.script.lock();
        script.closed.push((peer, notify));
        script.peers.retain(|(p, _)| p.id != peer);
    }

    fn shutdown(&mut self, drain_delay_ms: u32) {
        let mut script = self.script.lock();
        script.shutdown_calls.push(drain_delay_ms);
        script.active = false;
        script.peers.clear();
    }
}

/// One hook invocation seen by [`RecordingHandler`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookCall {
    Opened(PeerInfo),
    ReconnectStarted(Endpoint),
    Closed(PeerInfo, CloseReason),
    AttemptFailed(PeerInfo, FailureReason),
    Received(Bytes),
}

/// Handler that records every hook call in order
#[derive(Debug, Default, Clone)]
pub struct RecordingHandler {
    pub calls: Vec<HookCall>,
}

impl RecordingHandler {
    pub fn opened(&self) -> usize {
        self.count(|c| matches!(c, HookCall::Opened(_)))
    }

    pub fn reconnects(&self) -> usize {
        self.count(|c| matches!(c, HookCall::ReconnectStarted(_)))
    }

    pub fn closed(&self) -> Vec<CloseReason> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HookCall::Closed(_, reason) => Some(*reason),
                _ => None,
            })
            .collect()
    }

    pub fn failures(&self) -> Vec<FailureReason> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HookCall::AttemptFailed(_, reason) => Some(*reason),
                _ => None,
            })
            .collect()
    }

    pub fn received(&self) -> Vec<Bytes> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                HookCall::Received(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&HookCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl ClientHandler for RecordingHandler {
    fn on_connection_opened(&mut self, peer: &PeerInfo) {
        self.calls.push(HookCall::Opened(peer.clone()));
    }

    fn on_reconnect_started(&mut self, target: &Endpoint) {
        self.calls.push(HookCall::ReconnectStarted(target.clone()));
    }

    fn on_connection_closed(&mut self, peer: &PeerInfo, reason: CloseReason) {
        self.calls.push(HookCall::Closed(peer.clone(), reason));
    }

    fn on_connection_attempt_failed(&mut self, peer: &PeerInfo, reason: FailureReason) {
        self.calls.push(HookCall::AttemptFailed(peer.clone(), reason));
    }

    fn on_received(&mut self, data: Bytes) {
        self.calls.push(HookCall::Received(data));
    }
}
