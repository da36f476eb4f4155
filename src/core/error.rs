//! Error types for the voicelink protocol.

use thiserror::Error;

/// Errors produced by the packet codec.
///
/// Decode errors are recoverable by policy: the transport counts the
/// offending datagram as dropped and keeps receiving.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// The byte length is inconsistent with the declared structure.
    #[error("malformed packet: {0}")]
    Malformed(&'static str),

    /// The version tag is not the supported protocol version.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this implementation speaks.
        expected: u8,
        /// Version tag carried by the datagram.
        actual: u8,
    },

    /// Checksum verification failed.
    #[error("corrupted packet: checksum expected {expected:08x}, got {actual:08x}")]
    Corrupted {
        /// CRC-32 recomputed over the received bytes.
        expected: u32,
        /// CRC-32 carried in the trailer.
        actual: u32,
    },

    /// The payload exceeds the maximum encodable size.
    #[error("payload too large: {size} bytes (maximum {max})")]
    PayloadTooLarge {
        /// Offered payload size.
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },
}

/// Reason a connection reached the error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorReason {
    /// No handshake reply within the configured attempts.
    HandshakeTimeout,
    /// No packet from the peer within the heartbeat miss threshold.
    PeerTimeout,
    /// A local socket or OS-level send failure.
    Unreachable,
}

impl std::fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HandshakeTimeout => write!(f, "handshake timeout"),
            Self::PeerTimeout => write!(f, "peer timeout"),
            Self::Unreachable => write!(f, "peer unreachable"),
        }
    }
}

/// Errors raised while establishing or driving a connection.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionError {
    /// The handshake received no reply within the configured retry budget.
    #[error("handshake timed out")]
    HandshakeTimeout,

    /// Nothing was received from the peer within the miss threshold.
    #[error("peer timed out")]
    PeerTimeout,

    /// A local socket failure; reported immediately, never retried.
    #[error("peer unreachable")]
    Unreachable,

    /// The connection task has shut down.
    #[error("connection closed")]
    Closed,
}

impl From<ErrorReason> for ConnectionError {
    fn from(reason: ErrorReason) -> Self {
        match reason {
            ErrorReason::HandshakeTimeout => Self::HandshakeTimeout,
            ErrorReason::PeerTimeout => Self::PeerTimeout,
            ErrorReason::Unreachable => Self::Unreachable,
        }
    }
}

/// Top-level voicelink error.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Packet codec error.
    #[error("packet error: {0}")]
    Packet(#[from] PacketError),

    /// Connection-level error.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for voicelink operations.
pub type LinkResult<T> = Result<T, LinkError>;
