//! Poll-driven reconnecting client over a message transport.
//!
//! This crate holds the connection logic only: no runtime, no sockets, no
//! threads. A [`Client`] owns a [`Transport`] and a [`ClientHandler`]; the
//! host calls [`Client::poll`] from its scheduler and every event, retry and
//! hook runs inside that call.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  relink-core                 │
//! │                              │
//! │  client    ← lifecycle, send │
//! │  dispatch  ← poll loop       │
//! │  policy    ← retry budget    │
//! │  timer     ← deferred retry  │
//! │  protocol  ← frame, kinds    │
//! │  transport ← collaborator    │
//! └──────────────────────────────┘
//! ```

pub mod client;
pub mod config;
mod dispatch;
pub mod error;
pub mod handler;
pub mod policy;
pub mod protocol;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod timer;
pub mod transport;
pub mod types;

pub use client::{Client, NO_PING, SEND_FAILED};
pub use config::ClientConfig;
pub use error::{CoreError, CoreResult};
pub use handler::{ClientHandler, Decompressor, NoopHandler};
pub use policy::{ReconnectPolicy, RetryDecision};
pub use protocol::{EventKind, Frame};
pub use transport::{Transport, TransportEvent};
pub use types::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
