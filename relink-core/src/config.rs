//! Client configuration

use crate::error::{CoreError, CoreResult};
use crate::types::{PacketPriority, PacketReliability};
use std::time::Duration;

/// Longest reconnect interval accepted by [`ClientConfig::validate`]
pub const MAX_RECONNECT_INTERVAL: Duration = Duration::from_secs(3600);

/// Knobs for one [`Client`](crate::Client)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Priority of the transport's I/O thread, passed through on startup
    pub thread_priority: i32,
    /// How long teardown lets queued data drain, in milliseconds
    pub shutdown_delay_ms: u32,
    /// Priority used by `send`
    pub default_priority: PacketPriority,
    /// Reliability used by `send`
    pub default_reliability: PacketReliability,
    /// Peer timeout applied after every successful open, in milliseconds
    pub timeout_ms: u32,
    /// Automatic retries before a failure is reported
    pub reconnect_try_count: u32,
    /// Fixed delay between retries
    pub reconnect_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            thread_priority: 0,
            shutdown_delay_ms: 500,
            default_priority: PacketPriority::Immediate,
            default_reliability: PacketReliability::ReliableOrdered,
            timeout_ms: 10_000,
            reconnect_try_count: 3,
            reconnect_interval: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thread_priority(mut self, priority: i32) -> Self {
        self.thread_priority = priority;
        self
    }

    pub fn shutdown_delay_ms(mut self, delay_ms: u32) -> Self {
        self.shutdown_delay_ms = delay_ms;
        self
    }

    pub fn default_priority(mut self, priority: PacketPriority) -> Self {
        self.default_priority = priority;
        self
    }

    pub fn default_reliability(mut self, reliability: PacketReliability) -> Self {
        self.default_reliability = reliability;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn reconnect_try_count(mut self, count: u32) -> Self {
        self.reconnect_try_count = count;
        self
    }

    pub fn reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.timeout_ms == 0 {
            return Err(CoreError::config("Timeout must be greater than 0"));
        }
        if self.reconnect_interval > MAX_RECONNECT_INTERVAL {
            return Err(CoreError::config(format!(
                "Reconnect interval must not exceed {}s",
                MAX_RECONNECT_INTERVAL.as_secs()
            )));
        }
        Ok(())
    }
}

/// Presets
impl ClientConfig {
    /// Local network: short timeout, quick retries
    pub fn lan() -> Self {
        Self::default()
            .timeout_ms(3_000)
            .reconnect_try_count(5)
            .reconnect_interval(Duration::from_millis(500))
    }

    /// Lossy links: long timeout, patient retries
    pub fn mobile() -> Self {
        Self::default()
            .timeout_ms(30_000)
            .reconnect_try_count(10)
            .reconnect_interval(Duration::from_secs(5))
    }

    /// Report every failure immediately
    pub fn no_reconnect() -> Self {
        Self::default().reconnect_try_count(0)
    }
}
