//! Shared test helpers for relink-core integration tests
#![allow(dead_code)]

use relink_core::testing::{RecordingHandler, ScriptHandle, ScriptedTransport};
use relink_core::{Client, ClientConfig, Endpoint, PeerId, PeerInfo};
use std::time::Duration;

pub type TestClient = Client<ScriptedTransport, RecordingHandler>;

pub const HOST: &str = "game.example.com";
pub const PORT: u16 = 7777;
pub const INTERVAL: Duration = Duration::from_secs(2);

/// Install a subscriber once so `RUST_LOG=debug cargo test` shows client logs.
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

pub fn client_with(config: ClientConfig) -> (TestClient, ScriptHandle) {
    init_tracing();
    let transport = ScriptedTransport::new();
    let script = transport.handle();
    let client = Client::new(transport, RecordingHandler::default(), config).unwrap();
    (client, script)
}

pub fn client() -> (TestClient, ScriptHandle) {
    client_with(ClientConfig::default())
}

/// Connect and complete the handshake at `now`.
pub fn connected_client(
    config: ClientConfig,
    now: std::time::Instant,
) -> (TestClient, ScriptHandle) {
    let (mut client, script) = client_with(config);
    client.connect(HOST, PORT);
    script.accept(&server_peer());
    client.poll_at(now);
    (client, script)
}
