//! Poll loop: due timers first, then every queued transport event.

use crate::client::{Client, TimerAction};
use crate::handler::ClientHandler;
use crate::protocol::{message_name, EventKind, Frame};
use crate::transport::{Transport, TransportEvent};
use crate::types::{CloseReason, FailureReason, PeerInfo, SendTarget};

use std::time::Instant;
use tracing::{debug, error, info, warn};

impl<T: Transport, H: ClientHandler> Client<T, H> {
    /// Run one scheduling tick at the current time.
    ///
    /// Returns the number of transport events consumed.
    pub fn poll(&mut self) -> usize {
        self.poll_at(Instant::now())
    }

    /// Run one scheduling tick at `now`.
    ///
    /// Due retries fire before the event queue is drained, so a retry and the
    /// events it produces never share a tick.
    pub fn poll_at(&mut self, now: Instant) -> usize {
        self.fire_timers(now);
        self.drain_events(now)
    }

    fn fire_timers(&mut self, now: Instant) {
        for (handle, action) in self.timers.pop_due(now) {
            if self.reconnect_timer == Some(handle) {
                self.reconnect_timer = None;
            }
            match action {
                TimerAction::Reconnect => self.reconnect(now),
            }
        }
    }

    fn reconnect(&mut self, now: Instant) {
        let Some(target) = self.target.clone() else {
            return;
        };
        debug_assert!(!self.closed_by_user, "retry scheduled after user close");

        info!(
            host = %target.host,
            port = target.port,
            remaining = self.policy.remaining(),
            "Reconnect"
        );
        self.handler.on_reconnect_started(&target);

        let outcome = self.connect_target();
        if !outcome.is_pending_or_connected() {
            error!(outcome = ?outcome, addr = %target, "Reconnect attempt could not start");
            self.handle_attempt_failed(
                PeerInfo::unassigned(target),
                FailureReason::ConnectionAttemptFailed,
                now,
            );
        }
    }

    fn drain_events(&mut self, now: Instant) -> usize {
        let mut count = 0;
        loop {
            let Some(event) = self.transport.as_mut().and_then(|t| t.poll_next_event()) else {
                break;
            };
            count += 1;

            self.dispatch(&event, now);

            if let Some(transport) = self.transport.as_mut() {
                transport.release_event(event);
            }
        }
        count
    }

    fn dispatch(&mut self, event: &TransportEvent, now: Instant) {
        let Some(kind) = event.kind() else {
            warn!(peer = %event.peer.id, "Empty message skipped");
            return;
        };

        match EventKind::classify(kind) {
            EventKind::Lost(reason) => self.handle_lost(event.peer.clone(), reason, now),
            EventKind::Opened => self.handle_opened(&event.peer),
            EventKind::AttemptFailed(reason) => {
                error!(
                    kind = message_name(kind),
                    addr = %event.peer.addr,
                    "Connection attempt failed"
                );
                self.handle_attempt_failed(event.peer.clone(), reason, now);
            }
            EventKind::Data => self.handle_data(event),
            EventKind::Unknown(kind) => {
                warn!(
                    kind,
                    name = message_name(kind),
                    bytes = event.len(),
                    "Unhandled message"
                );
            }
        }
    }

    fn handle_lost(&mut self, peer: PeerInfo, reason: CloseReason, now: Instant) {
        if self.closed_by_user {
            debug!(peer = %peer.id, reason = ?reason, "Loss after user close ignored");
            return;
        }

        error!(addr = %peer.addr, peer = %peer.id, reason = ?reason, "Connection lost");

        match self.try_schedule_reconnect(now) {
            Some(delay) => {
                info!(
                    delay_ms = delay.as_millis() as u64,
                    remaining = self.policy.remaining(),
                    "Connection will be retried"
                );
            }
            None => self.handler.on_connection_closed(&peer, reason),
        }
    }

    fn handle_attempt_failed(&mut self, peer: PeerInfo, reason: FailureReason, now: Instant) {
        match self.try_schedule_reconnect(now) {
            Some(delay) => {
                info!(
                    reason = ?reason,
                    delay_ms = delay.as_millis() as u64,
                    remaining = self.policy.remaining(),
                    "Connection attempt will be retried"
                );
            }
            None => {
                warn!(reason = ?reason, addr = %peer.addr, "Connection attempt failed, giving up");
                self.handler.on_connection_attempt_failed(&peer, reason);
            }
        }
    }

    fn handle_opened(&mut self, peer: &PeerInfo) {
        info!(addr = %peer.addr, peer = %peer.id, "Connection opened");

        self.policy.reset();
        self.cancel_reconnect();
        if let Some(transport) = self.transport.as_mut() {
            transport.set_timeout(self.config.timeout_ms, SendTarget::Broadcast);
        }

        self.handler.on_connection_opened(peer);
    }

    fn handle_data(&mut self, event: &TransportEvent) {
        let frame = match Frame::decode(event.data.clone()) {
            Ok(frame) => frame,
            Err(e) => {
                error!(peer = %event.peer.id, error = %e, "Malformed frame dropped");
                return;
            }
        };

        if !frame.compressed {
            self.handler.on_received(frame.payload);
            return;
        }

        let Some(decompressor) = self.decompressor.as_mut() else {
            warn!(bytes = frame.payload.len(), "Compressed frame dropped, no decompressor");
            return;
        };
        match decompressor.decompress(&frame.payload) {
            Some(payload) => self.handler.on_received(payload),
            None => {
                warn!(bytes = frame.payload.len(), "Compressed frame dropped, inflate failed")
            }
        }
    }
}
