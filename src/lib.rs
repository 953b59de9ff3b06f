//! # relink: async reconnecting client
//!
//! A client for message-oriented, unreliable-datagram transports that keeps a
//! connection alive: bounded fixed-interval retries, typed failure reasons,
//! and a small frame format for application data.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │  relink  (this crate)                 │
//! │                                       │
//! │  RelinkClient  ← user API             │
//! │  actor         ← owns and polls       │
//! │  metrics       ← process counters     │
//! ├───────────────────────────────────────┤
//! │  relink-core  (dependency)            │
//! │                                       │
//! │  Client      ← poll-driven state      │
//! │  protocol    ← frame & message kinds  │
//! │  Transport   ← peer engine contract   │
//! └───────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relink::{ClientEvent, RelinkClient, RelinkConfig, Transport};
//!
//! async fn run<T: Transport>(transport: T) -> Result<(), Box<dyn std::error::Error>> {
//!     let (client, mut events) = RelinkClient::spawn(transport, RelinkConfig::default())?;
//!
//!     client.connect("game.example.com", 7777).await?;
//!     while let Some(event) = events.recv().await {
//!         if let ClientEvent::Opened { .. } = event {
//!             client.send(&b"hello"[..], 0).await?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// ── Layer 1: Core client (re-exported from relink-core) ────────────────

/// Frame format and message kinds.
pub use relink_core::protocol;

/// In-memory transport for tests.
#[cfg(feature = "testing")]
pub use relink_core::testing;

/// Direct access to the standalone `relink-core` crate.
pub use relink_core;

pub use relink_core::{
    AttemptOutcome, ClientHandler, CloseReason, ConnectResult, Decompressor, Endpoint,
    FailureReason, PacketPriority, PacketReliability, PeerId, PeerInfo, Phase, PingStats,
    SendTarget, StartupResult, Transport, TransportEvent,
};

// ── Layer 2: Configuration & errors ─────────────────────────────────────

pub mod config;
pub mod error;
pub mod event;
pub use config::RelinkConfig;
pub use error::{ConnectionError, RelinkError, Result};
pub use event::ClientEvent;

// ── Layer 3: Async driver ───────────────────────────────────────────────

#[cfg(feature = "tokio")]
pub(crate) mod actor;
#[cfg(feature = "tokio")]
pub mod client;
#[cfg(feature = "tokio")]
pub use client::RelinkClient;
#[cfg(feature = "tokio")]
pub mod metrics;

// ── Version info ────────────────────────────────────────────────────────

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROTOCOL_VERSION: u32 = 1;
