//! Actor-based client driver: owns the relink-core `Client` in a dedicated
//! task and is the only code that polls it.

use crate::error::{RelinkError, Result};
use crate::event::ClientEvent;
use crate::metrics::GlobalMetrics;

use bytes::Bytes;
use relink_core::{
    AttemptOutcome, Client, ClientHandler, CloseReason, Endpoint, FailureReason, PacketPriority,
    PacketReliability, PeerInfo, Phase, PingStats, Transport,
};
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

/// Commands sent to the client actor.
pub(crate) enum ClientCmd {
    Connect {
        host: String,
        port: u16,
        reply: oneshot::Sender<AttemptOutcome>,
    },
    Send {
        data: Bytes,
        channel: u8,
        options: Option<(PacketPriority, PacketReliability)>,
        reply: oneshot::Sender<i32>,
    },
    Disconnect {
        reply: oneshot::Sender<()>,
    },
    State {
        reply: oneshot::Sender<Phase>,
    },
    IsActive {
        reply: oneshot::Sender<bool>,
    },
    PingStats {
        reply: oneshot::Sender<Option<PingStats>>,
    },
    SetTimeout {
        timeout_ms: u32,
        reply: oneshot::Sender<()>,
    },
    ReconnectBudget {
        reply: oneshot::Sender<u32>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
    Close,
}

/// Clonable, lock-free handle to the client actor.
#[derive(Clone)]
pub(crate) struct ClientHandle {
    cmd_tx: mpsc::Sender<ClientCmd>,
}

impl ClientHandle {
    pub fn new(cmd_tx: mpsc::Sender<ClientCmd>) -> Self {
        Self { cmd_tx }
    }

    /// Send a command and wait for the reply. Returns a connection-closed error
    /// if the actor has exited.
    async fn request<T>(&self, cmd: impl FnOnce(oneshot::Sender<T>) -> ClientCmd) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(cmd(reply))
            .await
            .map_err(|_| RelinkError::closed())?;
        rx.await.map_err(|_| RelinkError::closed())
    }

    pub async fn connect(&self, host: String, port: u16) -> Result<AttemptOutcome> {
        self.request(|reply| ClientCmd::Connect { host, port, reply })
            .await
    }

    pub async fn send(
        &self,
        data: Bytes,
        channel: u8,
        options: Option<(PacketPriority, PacketReliability)>,
    ) -> Result<i32> {
        self.request(|reply| ClientCmd::Send {
            data,
            channel,
            options,
            reply,
        })
        .await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.request(|reply| ClientCmd::Disconnect { reply }).await
    }

    pub async fn state(&self) -> Result<Phase> {
        self.request(|reply| ClientCmd::State { reply }).await
    }

    pub async fn is_active(&self) -> bool {
        self.request(|reply| ClientCmd::IsActive { reply })
            .await
            .unwrap_or(false)
    }

    pub async fn ping_stats(&self) -> Result<Option<PingStats>> {
        self.request(|reply| ClientCmd::PingStats { reply }).await
    }

    pub async fn set_timeout(&self, timeout_ms: u32) -> Result<()> {
        self.request(|reply| ClientCmd::SetTimeout { timeout_ms, reply })
            .await
    }

    pub async fn reconnect_budget(&self) -> Result<u32> {
        self.request(|reply| ClientCmd::ReconnectBudget { reply })
            .await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| ClientCmd::Shutdown { reply }).await
    }

    pub fn close(&self) {
        let _ = self.cmd_tx.try_send(ClientCmd::Close);
    }
}

/// Hook implementation that forwards every callback as a [`ClientEvent`].
///
/// Hooks run inside `poll` and must not block, so a full event channel drops
/// the event and counts it.
pub(crate) struct ChannelHandler {
    events: mpsc::Sender<ClientEvent>,
    metrics: &'static GlobalMetrics,
}

impl ChannelHandler {
    pub fn new(events: mpsc::Sender<ClientEvent>, metrics: &'static GlobalMetrics) -> Self {
        Self { events, metrics }
    }

    fn emit(&self, event: ClientEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.metrics.event_dropped();
                warn!(event = ?event, "Event channel full, event dropped");
            }
            Err(TrySendError::Closed(_)) => {
                trace!("Event receiver gone");
            }
        }
    }
}

impl ClientHandler for ChannelHandler {
    fn on_connection_opened(&mut self, peer: &PeerInfo) {
        self.metrics.connection_opened();
        self.emit(ClientEvent::Opened { peer: peer.clone() });
    }

    fn on_reconnect_started(&mut self, target: &Endpoint) {
        self.metrics.reconnect_started();
        self.emit(ClientEvent::ReconnectStarted {
            target: target.clone(),
        });
    }

    fn on_connection_closed(&mut self, peer: &PeerInfo, reason: CloseReason) {
        self.metrics.connection_closed();
        self.emit(ClientEvent::Closed {
            peer: peer.clone(),
            reason,
        });
    }

    fn on_connection_attempt_failed(&mut self, peer: &PeerInfo, reason: FailureReason) {
        self.metrics.attempt_failed();
        self.emit(ClientEvent::AttemptFailed {
            peer: peer.clone(),
            reason,
        });
    }

    fn on_received(&mut self, data: Bytes) {
        self.metrics.frame_received(data.len());
        self.emit(ClientEvent::Received { data });
    }
}

/// Run the client actor loop.
///
/// Every `tick_interval` the client is polled at the runtime's clock, so a
/// paused test clock drives the reconnect timer too. The loop ends on
/// `Close`, `Shutdown`, or when every handle is dropped; the transport is torn
/// down on every exit path.
pub(crate) async fn run_client_actor<T: Transport>(
    mut client: Client<T, ChannelHandler>,
    mut cmd_rx: mpsc::Receiver<ClientCmd>,
    tick_interval: Duration,
    metrics: &'static GlobalMetrics,
) {
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    metrics.client_started();

    loop {
        tokio::select! {
            biased;

            // Periodic poll (prioritized so retries fire on time)
            _ = interval.tick() => {
                let drained = client.poll_at(tokio::time::Instant::now().into_std());
                if drained > 0 {
                    trace!(events = drained, "Transport events dispatched");
                }
            }

            // User commands
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ClientCmd::Connect { host, port, reply }) => {
                        let _ = reply.send(client.connect(host, port));
                    }
                    Some(ClientCmd::Send { data, channel, options, reply }) => {
                        let result = match options {
                            Some((priority, reliability)) => {
                                client.send_with_option(&data, channel, priority, reliability)
                            }
                            None => client.send(&data, channel),
                        };
                        if result > 0 {
                            metrics.frame_sent(data.len());
                        } else {
                            metrics.send_failed();
                        }
                        let _ = reply.send(result);
                    }
                    Some(ClientCmd::Disconnect { reply }) => {
                        client.disconnect();
                        let _ = reply.send(());
                    }
                    Some(ClientCmd::State { reply }) => {
                        let _ = reply.send(client.state());
                    }
                    Some(ClientCmd::IsActive { reply }) => {
                        let _ = reply.send(client.is_active());
                    }
                    Some(ClientCmd::PingStats { reply }) => {
                        let _ = reply.send(client.ping_stats());
                    }
                    Some(ClientCmd::SetTimeout { timeout_ms, reply }) => {
                        client.set_timeout(timeout_ms);
                        let _ = reply.send(());
                    }
                    Some(ClientCmd::ReconnectBudget { reply }) => {
                        let _ = reply.send(client.reconnect_budget());
                    }
                    Some(ClientCmd::Shutdown { reply }) => {
                        client.shutdown();
                        let _ = reply.send(());
                        break;
                    }
                    Some(ClientCmd::Close) | None => {
                        debug!("Client handle closed, stopping actor");
                        break;
                    }
                }
            }
        }
    }

    client.shutdown();
    metrics.client_stopped();
}
