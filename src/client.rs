//! Async handle to a reconnecting client

use crate::actor::{run_client_actor, ChannelHandler, ClientCmd, ClientHandle};
use crate::config::RelinkConfig;
use crate::error::{RelinkError, Result};
use crate::event::ClientEvent;
use crate::metrics::global_metrics;

use bytes::Bytes;
use relink_core::{
    AttemptOutcome, Client, ClientConfig, Decompressor, PacketPriority, PacketReliability, Phase,
    PingStats, Transport, NO_PING,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

/// Async client over a [`Transport`].
///
/// The transport and the connection state live in a background task; this
/// handle talks to it over a command channel. Hook notifications arrive on
/// the [`ClientEvent`] receiver returned by [`spawn`](RelinkClient::spawn).
/// Dropping the handle stops the task, which shuts the transport down.
pub struct RelinkClient {
    handle: ClientHandle,
    task: Option<JoinHandle<()>>,
}

impl RelinkClient {
    /// Start the client actor on the current tokio runtime.
    ///
    /// The transport is not started until the first [`connect`](Self::connect).
    pub fn spawn<T: Transport>(
        transport: T,
        config: RelinkConfig,
    ) -> Result<(Self, mpsc::Receiver<ClientEvent>)> {
        Self::spawn_inner(transport, config, None)
    }

    /// Like [`spawn`](Self::spawn), inflating inbound compressed frames with
    /// `decompressor`.
    pub fn spawn_with_decompressor<T: Transport>(
        transport: T,
        config: RelinkConfig,
        decompressor: Box<dyn Decompressor>,
    ) -> Result<(Self, mpsc::Receiver<ClientEvent>)> {
        Self::spawn_inner(transport, config, Some(decompressor))
    }

    fn spawn_inner<T: Transport>(
        transport: T,
        config: RelinkConfig,
        decompressor: Option<Box<dyn Decompressor>>,
    ) -> Result<(Self, mpsc::Receiver<ClientEvent>)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
        let (cmd_tx, cmd_rx) = mpsc::channel::<ClientCmd>(config.command_capacity);

        let metrics = global_metrics();
        let handler = ChannelHandler::new(event_tx, metrics);
        let mut client = Client::new(transport, handler, ClientConfig::from(config.clone()))?;
        if let Some(decompressor) = decompressor {
            client = client.with_decompressor(decompressor);
        }

        let task = tokio::spawn(run_client_actor(
            client,
            cmd_rx,
            config.tick_interval,
            metrics,
        ));
        info!(tick_ms = config.tick_interval.as_millis() as u64, "Client actor started");

        Ok((
            Self {
                handle: ClientHandle::new(cmd_tx),
                task: Some(task),
            },
            event_rx,
        ))
    }

    /// Connect to `host:port`, retrying per the configured policy.
    ///
    /// Returns the outcome when an attempt is started, already in progress, or
    /// already connected. Any other outcome is returned as
    /// [`ConnectionError::Rejected`](crate::ConnectionError::Rejected).
    pub async fn connect(&self, host: impl Into<String>, port: u16) -> Result<AttemptOutcome> {
        let outcome = self.handle.connect(host.into(), port).await?;
        if outcome.is_pending_or_connected() {
            Ok(outcome)
        } else {
            Err(RelinkError::rejected(outcome))
        }
    }

    /// Send with the configured default priority and reliability.
    ///
    /// Returns the transport's positive result, or [`RelinkError::Send`] when
    /// the transport refuses the frame.
    pub async fn send(&self, data: impl Into<Bytes>, channel: u8) -> Result<u32> {
        let result = self.handle.send(data.into(), channel, None).await?;
        Self::send_result(result, channel)
    }

    pub async fn send_with_option(
        &self,
        data: impl Into<Bytes>,
        channel: u8,
        priority: PacketPriority,
        reliability: PacketReliability,
    ) -> Result<u32> {
        let result = self
            .handle
            .send(data.into(), channel, Some((priority, reliability)))
            .await?;
        Self::send_result(result, channel)
    }

    fn send_result(result: i32, channel: u8) -> Result<u32> {
        u32::try_from(result)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| RelinkError::send(channel))
    }

    /// Close the connection; no retry follows.
    pub async fn disconnect(&self) -> Result<()> {
        self.handle.disconnect().await
    }

    pub async fn state(&self) -> Result<Phase> {
        self.handle.state().await
    }

    /// Whether the transport session is started. `false` once the actor has
    /// stopped.
    pub async fn is_active(&self) -> bool {
        self.handle.is_active().await
    }

    /// Ping statistics of the connected peer, `None` without one.
    pub async fn ping_stats(&self) -> Result<Option<PingStats>> {
        self.handle.ping_stats().await
    }

    pub async fn average_ping(&self) -> Result<Option<i32>> {
        Ok(self.ping_stats().await?.map(|s| s.average).filter(|p| *p != NO_PING))
    }

    pub async fn last_ping(&self) -> Result<Option<i32>> {
        Ok(self.ping_stats().await?.map(|s| s.last).filter(|p| *p != NO_PING))
    }

    pub async fn lowest_ping(&self) -> Result<Option<i32>> {
        Ok(self.ping_stats().await?.map(|s| s.lowest).filter(|p| *p != NO_PING))
    }

    pub async fn set_timeout(&self, timeout_ms: u32) -> Result<()> {
        self.handle.set_timeout(timeout_ms).await
    }

    /// Retries left before a failure is reported.
    pub async fn reconnect_budget(&self) -> Result<u32> {
        self.handle.reconnect_budget().await
    }

    /// Stop the actor and wait until the transport is shut down.
    pub async fn shutdown(mut self) -> Result<()> {
        let result = self.handle.shutdown().await;
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        result
    }
}

impl Drop for RelinkClient {
    fn drop(&mut self) {
        self.handle.close();
    }
}
