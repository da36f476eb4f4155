//! Protocol constants for the voicelink wire format and timers.
//!
//! The wire-format values are fixed by the protocol version and MUST NOT be
//! changed without bumping [`PROTOCOL_VERSION`].

use std::time::Duration;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Current protocol version tag. Receivers reject any other value.
pub const PROTOCOL_VERSION: u8 = 1;

/// Packet header size (version + type + sequence + timestamp + payload length).
pub const HEADER_SIZE: usize = 1 + 1 + 4 + 8 + 2;

/// CRC-32 trailer size.
pub const CHECKSUM_SIZE: usize = 4;

/// Smallest possible packet (empty payload).
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Maximum payload size. Keeps a full data packet at or under 250 bytes on
/// the wire, well inside a safe transmission unit for LAN voice frames.
pub const MAX_PAYLOAD: usize = 230;

/// Maximum on-wire packet size.
pub const MAX_PACKET_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD + CHECKSUM_SIZE;

// =============================================================================
// PACKET TYPES
// =============================================================================

/// Handshake request (dialer -> listener, step 1 of 3).
pub const PACKET_TYPE_HANDSHAKE_REQUEST: u8 = 0x01;

/// Handshake accept (listener -> dialer, step 2 of 3).
pub const PACKET_TYPE_HANDSHAKE_ACCEPT: u8 = 0x02;

/// Handshake confirm (dialer -> listener, step 3 of 3).
pub const PACKET_TYPE_HANDSHAKE_CONFIRM: u8 = 0x03;

/// Opaque audio payload.
pub const PACKET_TYPE_DATA: u8 = 0x04;

/// Periodic liveness packet.
pub const PACKET_TYPE_HEARTBEAT: u8 = 0x05;

/// Graceful teardown notification.
pub const PACKET_TYPE_DISCONNECT: u8 = 0x06;

// =============================================================================
// TIMING DEFAULTS
// =============================================================================

/// Default UDP port for a listening peer.
pub const DEFAULT_PORT: u16 = 9001;

/// Default per-attempt handshake timeout.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default number of handshake resends after the initial request.
pub const DEFAULT_HANDSHAKE_RETRIES: u32 = 3;

/// Default interval between heartbeats while connected.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of missed heartbeat intervals before the peer is
/// declared lost.
pub const DEFAULT_HEARTBEAT_MISS_THRESHOLD: u32 = 3;

/// Default depth of the outbound frame queue.
pub const DEFAULT_SEND_QUEUE_DEPTH: usize = 64;

/// Default depth of the caller-facing event queue (~2s of audio at 50 fps).
pub const DEFAULT_EVENT_QUEUE_DEPTH: usize = 100;

/// Default reorder tolerance: a data packet arriving at most this many
/// sequence numbers behind the highest accepted one is still delivered.
pub const DEFAULT_REORDER_TOLERANCE: u32 = 16;
