//! Client actor: commands, event forwarding, retry timing and teardown.
//!
//! Runtime time is paused, so the 2s reconnect interval elapses instantly and
//! deterministically.

mod common;

use bytes::Bytes;
use common::*;
use relink::metrics::global_metrics;
use relink::protocol::constants::*;
use relink::{
    AttemptOutcome, ClientEvent, CloseReason, ConnectResult, FailureReason, PacketPriority,
    PacketReliability, PeerId, Phase, PingStats, RelinkClient, RelinkConfig, RelinkError,
    StartupResult,
};
use std::time::Duration;
use tokio::time::{sleep, Instant};

#[tokio::test(start_paused = true)]
async fn test_attempt_failures_retry_then_report() {
    let (client, mut events, script) = spawn(RelinkConfig::default());

    assert_eq!(
        client.connect(HOST, PORT).await.unwrap(),
        AttemptOutcome::AttemptStarted
    );

    for _ in 0..3 {
        let failed_at = Instant::now();
        script.fail_attempt(&server(), MSG_CONNECTION_ATTEMPT_FAILED);

        let event = next_event(&mut events).await;
        assert_eq!(event, ClientEvent::ReconnectStarted { target: server() });
        assert!(failed_at.elapsed() >= Duration::from_secs(2));
    }

    script.fail_attempt(&server(), MSG_CONNECTION_BANNED);
    let event = next_event(&mut events).await;
    assert_eq!(
        event,
        ClientEvent::AttemptFailed {
            peer: relink::PeerInfo::unassigned(server()),
            reason: FailureReason::ConnectionBanned,
        }
    );
    assert!(event.is_terminal());
    assert_eq!(client.reconnect_budget().await.unwrap(), 0);
    assert_eq!(script.connect_calls().len(), 4);

    // No further retry
    sleep(Duration::from_secs(10)).await;
    assert_eq!(script.connect_calls().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_open_state_and_ping() {
    let (client, mut events, script) = spawn(RelinkConfig::default());

    assert_eq!(client.state().await.unwrap(), Phase::NotConnected);
    assert_eq!(client.average_ping().await.unwrap(), None);

    client.connect(HOST, PORT).await.unwrap();
    assert!(client.is_active().await);

    script.set_ping(
        PeerId(1),
        PingStats {
            average: 48,
            last: 50,
            lowest: 31,
        },
    );
    script.accept(&server_peer());
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Opened {
            peer: server_peer()
        }
    );

    assert_eq!(client.state().await.unwrap(), Phase::Connected);
    assert_eq!(client.average_ping().await.unwrap(), Some(48));
    assert_eq!(client.last_ping().await.unwrap(), Some(50));
    assert_eq!(client.lowest_ping().await.unwrap(), Some(31));
    assert_eq!(client.reconnect_budget().await.unwrap(), 3);
    assert_eq!(script.timeouts().len(), 1);

    client.set_timeout(2_500).await.unwrap();
    assert_eq!(script.timeouts().last().map(|(ms, _)| *ms), Some(2_500));
}

#[tokio::test(start_paused = true)]
async fn test_loss_reconnects_then_reports() {
    let config = RelinkConfig::default().reconnect(1, Duration::from_millis(500));
    let (client, mut events, script) = spawn(config);

    client.connect(HOST, PORT).await.unwrap();
    script.accept(&server_peer());
    next_event(&mut events).await;

    script.lose_connection(&server_peer());
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::ReconnectStarted { target: server() }
    );

    script.accept(&server_peer());
    next_event(&mut events).await;

    // Budget refilled by the open: one more retry before the report
    script.lose_connection(&server_peer());
    assert!(matches!(
        next_event(&mut events).await,
        ClientEvent::ReconnectStarted { .. }
    ));
    script.fail_attempt(&server(), MSG_CONNECTION_ATTEMPT_FAILED);
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::AttemptFailed {
            peer: relink::PeerInfo::unassigned(server()),
            reason: FailureReason::ConnectionAttemptFailed,
        }
    );
    drop(client);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_reports_user_close_only() {
    let (client, mut events, script) = spawn(RelinkConfig::default());

    client.connect(HOST, PORT).await.unwrap();
    script.accept(&server_peer());
    next_event(&mut events).await;

    client.disconnect().await.unwrap();
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Closed {
            peer: server_peer(),
            reason: CloseReason::ClosedByUser,
        }
    );

    script.push_event(&server_peer(), vec![MSG_CONNECTION_LOST]);
    sleep(Duration::from_secs(5)).await;

    assert!(events.try_recv().is_err());
    assert_eq!(script.connect_calls().len(), 1);
    assert_eq!(script.released(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_received_frames_forwarded() {
    let (client, mut events, script) = spawn(RelinkConfig::default());
    client.connect(HOST, PORT).await.unwrap();

    script.push_data(&server_peer(), b"state:1");
    script.push_data(&server_peer(), b"state:2");

    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Received {
            data: Bytes::from_static(b"state:1")
        }
    );
    assert_eq!(
        next_event(&mut events).await,
        ClientEvent::Received {
            data: Bytes::from_static(b"state:2")
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_send_results() {
    let (client, _events, script) = spawn(RelinkConfig::default());

    assert_eq!(client.send(&b"hello"[..], 0).await.unwrap(), 7);
    client
        .send_with_option(
            Bytes::from_static(b"pos"),
            4,
            PacketPriority::High,
            PacketReliability::UnreliableSequenced,
        )
        .await
        .unwrap();

    let sent = script.sent_frames();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].priority, PacketPriority::Immediate);
    assert_eq!(sent[0].reliability, PacketReliability::ReliableOrdered);
    assert_eq!(sent[1].channel, 4);
    assert_eq!(sent[1].reliability, PacketReliability::UnreliableSequenced);

    script.set_send_result(-1);
    let err = client.send(&b"x"[..], 9).await.unwrap_err();
    assert_eq!(err, RelinkError::send(9));
    assert!(err.is_recoverable());
}

#[tokio::test(start_paused = true)]
async fn test_rejected_connect() {
    let (client, _events, script) = spawn(RelinkConfig::default());

    script.set_connect_result(ConnectResult::CannotResolveDomainName);
    let err = client.connect("nowhere.invalid", PORT).await.unwrap_err();
    assert_eq!(
        err,
        RelinkError::rejected(AttemptOutcome::CannotResolveDomainName)
    );

    script.set_connect_result(ConnectResult::AttemptInProgress);
    assert_eq!(
        client.connect(HOST, PORT).await.unwrap(),
        AttemptOutcome::AttemptAlreadyInProgress
    );
}

#[tokio::test(start_paused = true)]
async fn test_startup_failure() {
    let (client, _events, script) = spawn(RelinkConfig::default());
    script.set_startup_result(StartupResult::Failed(-3));

    let err = client.connect(HOST, PORT).await.unwrap_err();
    assert!(err.is_fatal());
    assert!(!client.is_active().await);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_tears_down_transport() {
    let (client, mut events, script) = spawn(RelinkConfig::default().shutdown_delay_ms(250));
    client.connect(HOST, PORT).await.unwrap();

    client.shutdown().await.unwrap();
    assert_eq!(script.shutdown_calls(), vec![250]);
    assert!(events.recv().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_actor() {
    let (client, mut events, script) = spawn(RelinkConfig::default());
    client.connect(HOST, PORT).await.unwrap();

    drop(client);
    assert!(events.recv().await.is_none());
    assert_eq!(script.shutdown_calls(), vec![500]);
}

#[tokio::test(start_paused = true)]
async fn test_full_event_channel_drops_events() {
    let before = global_metrics().snapshot().events_dropped;
    let (client, mut events, script) = spawn(RelinkConfig::default().event_capacity(1));
    client.connect(HOST, PORT).await.unwrap();

    for i in 0..5u8 {
        script.push_data(&server_peer(), &[i]);
    }
    sleep(Duration::from_millis(50)).await;

    assert_eq!(
        events.recv().await,
        Some(ClientEvent::Received {
            data: Bytes::from_static(&[0])
        })
    );
    assert!(global_metrics().snapshot().events_dropped >= before + 4);
    assert_eq!(script.released(), 5);
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let result = RelinkClient::spawn(
        relink_core::testing::ScriptedTransport::new(),
        RelinkConfig::default().tick_interval(Duration::ZERO),
    );
    assert!(matches!(result, Err(RelinkError::Config { .. })));
}
