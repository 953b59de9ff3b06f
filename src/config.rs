//! Configuration types for relink.
//!
//! [`RelinkConfig`] carries the core [`ClientConfig`] knobs plus the settings
//! of the async driver (tick rate, channel sizes).

use crate::error::{RelinkError, Result};
use relink_core::{ClientConfig, PacketPriority, PacketReliability};
use std::time::Duration;

// ── RelinkConfig ────────────────────────────────────────────────────────

/// Full client configuration: connection settings + driver settings.
#[derive(Debug, Clone)]
pub struct RelinkConfig {
    // Connection settings (forwarded to relink-core)
    pub thread_priority: i32,
    pub shutdown_delay_ms: u32,
    pub default_priority: PacketPriority,
    pub default_reliability: PacketReliability,
    pub timeout_ms: u32,
    pub reconnect_try_count: u32,
    pub reconnect_interval: Duration,

    // Driver settings (used only by the actor)
    pub tick_interval: Duration,
    pub command_capacity: usize,
    pub event_capacity: usize,
}

impl Default for RelinkConfig {
    fn default() -> Self {
        let core = ClientConfig::default();
        Self {
            thread_priority: core.thread_priority,
            shutdown_delay_ms: core.shutdown_delay_ms,
            default_priority: core.default_priority,
            default_reliability: core.default_reliability,
            timeout_ms: core.timeout_ms,
            reconnect_try_count: core.reconnect_try_count,
            reconnect_interval: core.reconnect_interval,
            tick_interval: Duration::from_millis(10),
            command_capacity: 64,
            event_capacity: 256,
        }
    }
}

/// Extracts the connection fields that `relink_core::Client` reads.
impl From<RelinkConfig> for ClientConfig {
    fn from(c: RelinkConfig) -> Self {
        Self {
            thread_priority: c.thread_priority,
            shutdown_delay_ms: c.shutdown_delay_ms,
            default_priority: c.default_priority,
            default_reliability: c.default_reliability,
            timeout_ms: c.timeout_ms,
            reconnect_try_count: c.reconnect_try_count,
            reconnect_interval: c.reconnect_interval,
        }
    }
}

// ── Builder methods ─────────────────────────────────────────────────────

impl RelinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Connection --

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

    pub fn reconnect(mut self, try_count: u32, interval: Duration) -> Self {
        self.reconnect_try_count = try_count;
        self.reconnect_interval = interval;
        self
    }

    // -- Driver --

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn command_capacity(mut self, capacity: usize) -> Self {
        self.command_capacity = capacity;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    // -- Validation --

    pub fn validate(&self) -> Result<()> {
        ClientConfig::from(self.clone()).validate()?;

        if self.tick_interval.is_zero() {
            return Err(RelinkError::config("Tick interval must be greater than 0"));
        }
        if self.command_capacity == 0 || self.event_capacity == 0 {
            return Err(RelinkError::config("Channel capacities must be greater than 0"));
        }
        Ok(())
    }
}

// ── Presets ──────────────────────────────────────────────────────────────

impl RelinkConfig {
    pub fn lan() -> Self {
        Self::from_core(ClientConfig::lan()).tick_interval(Duration::from_millis(5))
    }

    pub fn mobile() -> Self {
        Self::from_core(ClientConfig::mobile()).tick_interval(Duration::from_millis(20))
    }

    pub fn no_reconnect() -> Self {
        Self::from_core(ClientConfig::no_reconnect())
    }

    fn from_core(core: ClientConfig) -> Self {
        Self {
            thread_priority: core.thread_priority,
            shutdown_delay_ms: core.shutdown_delay_ms,
            default_priority: core.default_priority,
            default_reliability: core.default_reliability,
            timeout_ms: core.timeout_ms,
            reconnect_try_count: core.reconnect_try_count,
            reconnect_interval: core.reconnect_interval,
            ..Self::default()
        }
    }
}
