//! Shared value types: endpoints, peer identity, phases and outcomes

use std::fmt;

/// Host and port of a remote system
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Opaque 32-bit identifier the transport assigns to a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u32);

impl PeerId {
    /// Identifier used when an event is not tied to a known peer
    pub const UNASSIGNED: PeerId = PeerId(u32::MAX);

    pub fn is_assigned(&self) -> bool {
        *self != Self::UNASSIGNED
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A peer as reported by the transport: address plus identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerInfo {
    pub addr: Endpoint,
    pub id: PeerId,
}

impl PeerInfo {
    pub fn new(addr: Endpoint, id: PeerId) -> Self {
        Self { addr, id }
    }

    /// Peer placeholder for failures raised before the transport knows a peer
    pub fn unassigned(addr: Endpoint) -> Self {
        Self {
            addr,
            id: PeerId::UNASSIGNED,
        }
    }
}

/// Lifecycle phase of a connection as reported by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Was never connected, or disconnected long enough ago to be forgotten
    NotConnected,
    /// Connect was called but processing has not begun
    PendingStart,
    /// Handshake in progress
    Connecting,
    /// Connected and able to communicate
    Connected,
    /// Will disconnect once remaining messages are delivered
    Disconnecting,
    /// A failed attempt that is being aborted
    SilentlyDisconnecting,
    /// No longer connected
    Disconnected,
}

impl Phase {
    pub fn is_connected(&self) -> bool {
        matches!(self, Phase::Connected)
    }
}

/// Round-trip time samples for one peer, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PingStats {
    pub average: i32,
    pub last: i32,
    pub lowest: i32,
}

/// Send priority, from most to least urgent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PacketPriority {
    /// Sent immediately, never aggregated
    #[default]
    Immediate,
    High,
    Medium,
    Low,
}

/// Delivery guarantee requested from the transport
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PacketReliability {
    /// Plain datagram with duplicate suppression
    Unreliable,
    /// Out-of-order messages are discarded
    UnreliableSequenced,
    /// Delivered, in any order
    Reliable,
    /// Delivered in send order per channel
    #[default]
    ReliableOrdered,
    /// Delivered, late messages are dropped
    ReliableSequenced,
}

/// Destination of a send or timeout setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SendTarget {
    /// Every connected peer; with one peer this is the current connection
    Broadcast,
    Peer(PeerId),
}

/// Result of `Transport::start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupResult {
    Started,
    AlreadyStarted,
    Failed(i32),
}

impl StartupResult {
    pub fn is_running(&self) -> bool {
        matches!(self, StartupResult::Started | StartupResult::AlreadyStarted)
    }
}

/// Result of `Transport::connect`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectResult {
    AttemptStarted,
    InvalidParameter,
    CannotResolveDomainName,
    AlreadyConnected,
    AttemptInProgress,
    SecurityInitFailed,
    Unknown(i32),
}

/// Outcome of `Client::connect` as seen by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    AttemptStarted,
    InvalidParameter,
    CannotResolveDomainName,
    AlreadyConnectedToEndpoint,
    AttemptAlreadyInProgress,
    SecurityInitializationFailed,
    /// The transport could not be started; not retried
    ConnectionStartupFailed,
    /// The transport has been released
    InvalidInterfaceInstance,
    UnknownError,
}

impl AttemptOutcome {
    /// Whether the transport will eventually report back on this attempt
    /// through an event (or already has a connection to the endpoint).
    pub fn is_pending_or_connected(&self) -> bool {
        matches!(
            self,
            AttemptOutcome::AttemptStarted
                | AttemptOutcome::AlreadyConnectedToEndpoint
                | AttemptOutcome::AttemptAlreadyInProgress
        )
    }
}

impl From<ConnectResult> for AttemptOutcome {
    fn from(r: ConnectResult) -> Self {
        match r {
            ConnectResult::AttemptStarted => AttemptOutcome::AttemptStarted,
            ConnectResult::InvalidParameter => AttemptOutcome::InvalidParameter,
            ConnectResult::CannotResolveDomainName => AttemptOutcome::CannotResolveDomainName,
            ConnectResult::AlreadyConnected => AttemptOutcome::AlreadyConnectedToEndpoint,
            ConnectResult::AttemptInProgress => AttemptOutcome::AttemptAlreadyInProgress,
            ConnectResult::SecurityInitFailed => AttemptOutcome::SecurityInitializationFailed,
            ConnectResult::Unknown(_) => AttemptOutcome::UnknownError,
        }
    }
}

/// Why an established connection ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// `disconnect` was called locally
    ClosedByUser,
    /// The remote sent a disconnection notification
    ClosedByRemote,
    /// The transport stopped hearing from the remote
    ConnectionLost,
}

/// Why a connection attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    ConnectionAttemptFailed,
    AlreadyConnected,
    NoFreeIncomingConnections,
    ConnectionBanned,
    InvalidPassword,
    IncompatibleProtocol,
    IpRecentlyConnected,
    RemoteSystemRequiresPublicKey,
    OurSystemRequiresSecurity,
    PublicKeyMismatch,
}
