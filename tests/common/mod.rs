//! Shared test helpers for relink integration tests
#![allow(dead_code)]

use relink_core::testing::{ScriptHandle, ScriptedTransport};
use relink::{ClientEvent, Endpoint, PeerId, PeerInfo, RelinkClient, RelinkConfig};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

pub const HOST: &str = "game.example.com";
pub const PORT: u16 = 7777;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn server() -> Endpoint {
    Endpoint::new(HOST, PORT)
}

pub fn server_peer() -> PeerInfo {
    PeerInfo::new(server(), PeerId(1))
}

/// Spawn a client over a fresh scripted transport.
pub fn spawn(config: RelinkConfig) -> (RelinkClient, mpsc::Receiver<ClientEvent>, ScriptHandle) {
    init_tracing();
    let transport = ScriptedTransport::new();
    let script = transport.handle();
    let (client, events) = RelinkClient::spawn(transport, config).unwrap();
    (client, events, script)
}

/// Next event, failing the test if none arrives within 60s of runtime time.
pub async fn next_event(events: &mut mpsc::Receiver<ClientEvent>) -> ClientEvent {
    timeout(Duration::from_secs(60), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}
