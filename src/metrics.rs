//! Process-wide counters for relink clients

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Global metrics collector
#[derive(Debug, Default)]
pub struct GlobalMetrics {
    /// Client actors currently running
    pub active_clients: AtomicUsize,
    /// Handshakes completed
    pub connections_opened: AtomicU64,
    /// Connections reported closed (after retries, or by the user)
    pub connections_closed: AtomicU64,
    /// Attempts reported failed after retries
    pub attempt_failures: AtomicU64,
    /// Automatic retries started
    pub reconnects_started: AtomicU64,
    /// Frames accepted by the transport
    pub frames_sent: AtomicU64,
    pub bytes_sent: AtomicU64,
    /// Sends the transport refused
    pub send_failures: AtomicU64,
    /// Application frames delivered
    pub frames_received: AtomicU64,
    pub bytes_received: AtomicU64,
    /// Events lost because the event channel was full
    pub events_dropped: AtomicU64,
}

impl GlobalMetrics {
    pub fn client_started(&self) {
        self.active_clients.fetch_add(1, Ordering::Relaxed);
    }

    pub fn client_stopped(&self) {
        self.active_clients.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn attempt_failed(&self) {
        self.attempt_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reconnect_started(&self) {
        self.reconnects_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_sent(&self, bytes: usize) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn send_failed(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_received(&self, bytes: usize) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active_clients: self.active_clients.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            attempt_failures: self.attempt_failures.load(Ordering::Relaxed),
            reconnects_started: self.reconnects_started.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub active_clients: usize,
    pub connections_opened: u64,
    pub connections_closed: u64,
    pub attempt_failures: u64,
    pub reconnects_started: u64,
    pub frames_sent: u64,
    pub bytes_sent: u64,
    pub send_failures: u64,
    pub frames_received: u64,
    pub bytes_received: u64,
    pub events_dropped: u64,
}

impl MetricsSnapshot {
    /// Share of sends the transport refused
    pub fn send_failure_rate(&self) -> f64 {
        let attempts = self.frames_sent + self.send_failures;
        if attempts == 0 {
            0.0
        } else {
            self.send_failures as f64 / attempts as f64
        }
    }
}

/// Global metrics instance
pub static GLOBAL_METRICS: std::sync::LazyLock<GlobalMetrics> =
    std::sync::LazyLock::new(GlobalMetrics::default);

/// Get global metrics
pub fn global_metrics() -> &'static GlobalMetrics {
    &GLOBAL_METRICS
}

/// Format metrics for human-readable display
pub fn format_metrics(snapshot: &MetricsSnapshot) -> String {
    format!(
        "Relink Metrics:\n\
         Clients: {} active\n\
         Connections: {} opened, {} closed, {} attempts failed, {} reconnects\n\
         Sent: {} frames, {} bytes ({} refused, {:.2}%)\n\
         Received: {} frames, {} bytes\n\
         Events dropped: {}",
        snapshot.active_clients,
        snapshot.connections_opened,
        snapshot.connections_closed,
        snapshot.attempt_failures,
        snapshot.reconnects_started,
        snapshot.frames_sent,
        snapshot.bytes_sent,
        snapshot.send_failures,
        snapshot.send_failure_rate() * 100.0,
        snapshot.frames_received,
        snapshot.bytes_received,
        snapshot.events_dropped,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = GlobalMetrics::default();

        metrics.client_started();
        metrics.frame_sent(10);
        metrics.frame_sent(6);
        metrics.send_failed();
        metrics.frame_received(4);
        assert_eq!(metrics.active_clients.load(Ordering::Relaxed), 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.frames_sent, 2);
        assert_eq!(snapshot.bytes_sent, 16);
        assert_eq!(snapshot.bytes_received, 4);
        assert!((snapshot.send_failure_rate() - 1.0 / 3.0).abs() < 1e-9);

        metrics.client_stopped();
        assert_eq!(metrics.active_clients.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_format() {
        let text = format_metrics(&MetricsSnapshot::default());
        assert!(text.starts_with("Relink Metrics:"));
        assert!(text.contains("0.00%"));
    }
}
