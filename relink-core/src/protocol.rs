//! Wire constants, frame codec, and the transport message taxonomy

use crate::error::{CoreError, CoreResult};
use crate::types::{CloseReason, FailureReason};
use bytes::{BufMut, Bytes, BytesMut};

/// Transport message kinds and frame layout sizes
pub mod constants {
    pub const MSG_CONNECTED_PING: u8 = 0; // internal ping
    pub const MSG_UNCONNECTED_PING: u8 = 1; // offline ping
    pub const MSG_CONNECTED_PONG: u8 = 3; // ping sample
    pub const MSG_DETECT_LOST_CONNECTIONS: u8 = 4; // keep-alive probe
    pub const MSG_CONNECTION_REQUEST: u8 = 9; // handshake request
    pub const MSG_REMOTE_SYSTEM_REQUIRES_PUBLIC_KEY: u8 = 10;
    pub const MSG_OUR_SYSTEM_REQUIRES_SECURITY: u8 = 11;
    pub const MSG_PUBLIC_KEY_MISMATCH: u8 = 12;
    pub const MSG_CONNECTION_REQUEST_ACCEPTED: u8 = 16;
    pub const MSG_CONNECTION_ATTEMPT_FAILED: u8 = 17;
    pub const MSG_ALREADY_CONNECTED: u8 = 18;
    pub const MSG_NEW_INCOMING_CONNECTION: u8 = 19;
    pub const MSG_NO_FREE_INCOMING_CONNECTIONS: u8 = 20;
    pub const MSG_DISCONNECTION_NOTIFICATION: u8 = 21;
    pub const MSG_CONNECTION_LOST: u8 = 22;
    pub const MSG_CONNECTION_BANNED: u8 = 23;
    pub const MSG_INVALID_PASSWORD: u8 = 24;
    pub const MSG_INCOMPATIBLE_PROTOCOL_VERSION: u8 = 25;
    pub const MSG_IP_RECENTLY_CONNECTED: u8 = 26;
    pub const MSG_TIMESTAMP: u8 = 27; // followed by an 8-byte time
    pub const MSG_USER_PACKET_ENUM: u8 = 134; // first application kind
    pub const MSG_APPLICATION_DATA: u8 = MSG_USER_PACKET_ENUM + 1;

    pub const MESSAGE_KIND_SIZE: usize = 1;
    pub const TIMESTAMP_SIZE: usize = 8;
    pub const COMPRESSION_FLAG_SIZE: usize = 1;
    pub const FRAME_HEADER_SIZE: usize = MESSAGE_KIND_SIZE + COMPRESSION_FLAG_SIZE;
}

use constants::*;

/// Bytes to skip from the start of an inbound message before its body.
pub fn data_offset(kind: u8) -> usize {
    match kind {
        MSG_TIMESTAMP => MESSAGE_KIND_SIZE + TIMESTAMP_SIZE,
        _ => MESSAGE_KIND_SIZE,
    }
}

/// Offset of the payload inside a frame of the given kind.
pub fn payload_offset(kind: u8) -> usize {
    data_offset(kind) + COMPRESSION_FLAG_SIZE
}

/// Transport name of a message kind, for logs
pub fn message_name(kind: u8) -> &'static str {
    match kind {
        MSG_CONNECTED_PING => "CONNECTED_PING",
        MSG_UNCONNECTED_PING => "UNCONNECTED_PING",
        MSG_CONNECTED_PONG => "CONNECTED_PONG",
        MSG_DETECT_LOST_CONNECTIONS => "DETECT_LOST_CONNECTIONS",
        MSG_CONNECTION_REQUEST => "CONNECTION_REQUEST",
        MSG_REMOTE_SYSTEM_REQUIRES_PUBLIC_KEY => "REMOTE_SYSTEM_REQUIRES_PUBLIC_KEY",
        MSG_OUR_SYSTEM_REQUIRES_SECURITY => "OUR_SYSTEM_REQUIRES_SECURITY",
        MSG_PUBLIC_KEY_MISMATCH => "PUBLIC_KEY_MISMATCH",
        MSG_CONNECTION_REQUEST_ACCEPTED => "CONNECTION_REQUEST_ACCEPTED",
        MSG_CONNECTION_ATTEMPT_FAILED => "CONNECTION_ATTEMPT_FAILED",
        MSG_ALREADY_CONNECTED => "ALREADY_CONNECTED",
        MSG_NEW_INCOMING_CONNECTION => "NEW_INCOMING_CONNECTION",
        MSG_NO_FREE_INCOMING_CONNECTIONS => "NO_FREE_INCOMING_CONNECTIONS",
        MSG_DISCONNECTION_NOTIFICATION => "DISCONNECTION_NOTIFICATION",
        MSG_CONNECTION_LOST => "CONNECTION_LOST",
        MSG_CONNECTION_BANNED => "CONNECTION_BANNED",
        MSG_INVALID_PASSWORD => "INVALID_PASSWORD",
        MSG_INCOMPATIBLE_PROTOCOL_VERSION => "INCOMPATIBLE_PROTOCOL_VERSION",
        MSG_IP_RECENTLY_CONNECTED => "IP_RECENTLY_CONNECTED",
        MSG_TIMESTAMP => "TIMESTAMP",
        MSG_APPLICATION_DATA => "APPLICATION_DATA",
        k if k >= MSG_USER_PACKET_ENUM => "USER_PACKET",
        _ => "UNKNOWN",
    }
}

/// What the dispatcher does with a message kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// An established connection ended without local request
    Lost(CloseReason),
    /// The handshake completed
    Opened,
    /// The attempt was rejected or timed out
    AttemptFailed(FailureReason),
    /// A frame carrying application payload
    Data,
    /// Anything else: logged, no state change
    Unknown(u8),
}

impl EventKind {
    pub fn classify(kind: u8) -> Self {
        match kind {
            MSG_DISCONNECTION_NOTIFICATION => EventKind::Lost(CloseReason::ClosedByRemote),
            MSG_CONNECTION_LOST => EventKind::Lost(CloseReason::ConnectionLost),
            MSG_CONNECTION_REQUEST_ACCEPTED => EventKind::Opened,
            MSG_CONNECTION_ATTEMPT_FAILED => {
                EventKind::AttemptFailed(FailureReason::ConnectionAttemptFailed)
            }
            MSG_REMOTE_SYSTEM_REQUIRES_PUBLIC_KEY => {
                EventKind::AttemptFailed(FailureReason::RemoteSystemRequiresPublicKey)
            }
            MSG_OUR_SYSTEM_REQUIRES_SECURITY => {
                EventKind::AttemptFailed(FailureReason::OurSystemRequiresSecurity)
            }
            MSG_PUBLIC_KEY_MISMATCH => EventKind::AttemptFailed(FailureReason::PublicKeyMismatch),
            MSG_ALREADY_CONNECTED => EventKind::AttemptFailed(FailureReason::AlreadyConnected),
            MSG_NO_FREE_INCOMING_CONNECTIONS => {
                EventKind::AttemptFailed(FailureReason::NoFreeIncomingConnections)
            }
            MSG_CONNECTION_BANNED => EventKind::AttemptFailed(FailureReason::ConnectionBanned),
            MSG_INVALID_PASSWORD => EventKind::AttemptFailed(FailureReason::InvalidPassword),
            MSG_INCOMPATIBLE_PROTOCOL_VERSION => {
                EventKind::AttemptFailed(FailureReason::IncompatibleProtocol)
            }
            MSG_IP_RECENTLY_CONNECTED => {
                EventKind::AttemptFailed(FailureReason::IpRecentlyConnected)
            }
            MSG_APPLICATION_DATA => EventKind::Data,
            other => EventKind::Unknown(other),
        }
    }
}

/// Application frame: message kind, compression flag, payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: u8,
    pub compressed: bool,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(kind: u8, compressed: bool, payload: Bytes) -> Self {
        Self {
            kind,
            compressed,
            payload,
        }
    }

    /// Uncompressed application-data frame
    pub fn data(payload: Bytes) -> Self {
        Self::new(MSG_APPLICATION_DATA, false, payload)
    }

    /// Total encoded size
    pub fn size(&self) -> usize {
        FRAME_HEADER_SIZE + self.payload.len()
    }

    /// Encode frame into buffer
    pub fn encode(&self, buf: &mut BytesMut) {
        put_frame(buf, self.kind, self.compressed, &self.payload);
    }

    /// Encode into a fresh buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.size());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode a frame from an inbound message.
    ///
    /// The body starts at [`data_offset`] of the leading kind byte; its first
    /// byte is the compression flag, which must be 0 or 1.
    pub fn decode(buf: Bytes) -> CoreResult<Self> {
        let kind = *buf
            .first()
            .ok_or_else(|| CoreError::frame("empty message"))?;
        let offset = data_offset(kind);

        let flag = *buf.get(offset).ok_or_else(|| {
            CoreError::frame(format!(
                "{} byte message too short for {} header",
                buf.len(),
                message_name(kind)
            ))
        })?;
        let compressed = match flag {
            0 => false,
            1 => true,
            other => {
                return Err(CoreError::frame(format!("invalid compression flag {other}")));
            }
        };

        Ok(Self {
            kind,
            compressed,
            payload: buf.slice(offset + COMPRESSION_FLAG_SIZE..),
        })
    }
}

/// Encode `payload` as a frame of `kind`.
pub fn encode_frame(kind: u8, compressed: bool, payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_HEADER_SIZE + payload.len());
    put_frame(&mut buf, kind, compressed, payload);
    buf.freeze()
}

fn put_frame(buf: &mut BytesMut, kind: u8, compressed: bool, payload: &[u8]) {
    buf.put_u8(kind);
    buf.put_u8(compressed as u8);
    buf.extend_from_slice(payload);
}
