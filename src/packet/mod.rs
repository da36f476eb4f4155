//! Packet encoding and decoding for the voicelink wire format.
//!
//! A packet is the unit of wire transmission. The codec is pure: encoding
//! assembles the full on-wire buffer and appends a CRC-32 over it as the
//! final step, and decoding verifies that CRC before trusting any field.
//!
//! Wire format (little-endian):
//!
//! ```text
//! +--------+--------+------------+----------------+------------+---------+----------+
//! | Ver    | Type   | Sequence   | Timestamp      | Length     | Payload | Checksum |
//! | 1 byte | 1 byte | 4 B (LE32) | 8 B (LE64, us) | 2 B (LE16) | N bytes | 4 B CRC  |
//! +--------+--------+------------+----------------+------------+---------+----------+
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::constants::{
    CHECKSUM_SIZE, HEADER_SIZE, MAX_PAYLOAD, MIN_PACKET_SIZE, PACKET_TYPE_DATA,
    PACKET_TYPE_DISCONNECT, PACKET_TYPE_HANDSHAKE_ACCEPT, PACKET_TYPE_HANDSHAKE_CONFIRM,
    PACKET_TYPE_HANDSHAKE_REQUEST, PACKET_TYPE_HEARTBEAT, PROTOCOL_VERSION,
};
use crate::core::error::PacketError;

/// Packet type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Handshake request (dialer -> listener).
    HandshakeRequest = PACKET_TYPE_HANDSHAKE_REQUEST,
    /// Handshake accept (listener -> dialer).
    HandshakeAccept = PACKET_TYPE_HANDSHAKE_ACCEPT,
    /// Handshake confirm (dialer -> listener).
    HandshakeConfirm = PACKET_TYPE_HANDSHAKE_CONFIRM,
    /// Opaque audio payload.
    Data = PACKET_TYPE_DATA,
    /// Periodic liveness packet.
    Heartbeat = PACKET_TYPE_HEARTBEAT,
    /// Graceful teardown notification.
    Disconnect = PACKET_TYPE_DISCONNECT,
}

impl PacketType {
    /// Parse a packet type from its wire byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            PACKET_TYPE_HANDSHAKE_REQUEST => Some(Self::HandshakeRequest),
            PACKET_TYPE_HANDSHAKE_ACCEPT => Some(Self::HandshakeAccept),
            PACKET_TYPE_HANDSHAKE_CONFIRM => Some(Self::HandshakeConfirm),
            PACKET_TYPE_DATA => Some(Self::Data),
            PACKET_TYPE_HEARTBEAT => Some(Self::Heartbeat),
            PACKET_TYPE_DISCONNECT => Some(Self::Disconnect),
            _ => None,
        }
    }

    /// Wire byte for this packet type.
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A decoded voicelink packet.
///
/// The checksum is not stored: it exists only on the wire, computed over the
/// fully assembled buffer at encode time and verified at decode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Protocol version tag.
    pub version: u8,
    /// Packet type.
    pub packet_type: PacketType,
    /// Per-connection wrapping sequence number, assigned by the sender.
    pub sequence: u32,
    /// Sender-side capture time, microseconds since the UNIX epoch.
    pub timestamp_us: u64,
    /// Opaque payload bytes.
    pub payload: Vec<u8>,
}

/// Current wall-clock time in microseconds since the UNIX epoch.
pub fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

impl Packet {
    fn control(packet_type: PacketType, sequence: u32, payload: Vec<u8>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            packet_type,
            sequence,
            timestamp_us: now_micros(),
            payload,
        }
    }

    /// Create a data packet carrying an opaque compressed audio frame.
    pub fn data(sequence: u32, payload: Vec<u8>) -> Self {
        Self::control(PacketType::Data, sequence, payload)
    }

    /// Create a heartbeat. `echo_sequence` is the sequence of the last
    /// heartbeat received from the peer, or 0 when none has been seen.
    pub fn heartbeat(sequence: u32, echo_sequence: u32) -> Self {
        Self::control(
            PacketType::Heartbeat,
            sequence,
            echo_sequence.to_le_bytes().to_vec(),
        )
    }

    /// Create a handshake request proposing a session identifier.
    pub fn handshake_request(sequence: u32, session_id: u32) -> Self {
        Self::control(
            PacketType::HandshakeRequest,
            sequence,
            session_id.to_le_bytes().to_vec(),
        )
    }

    /// Create a handshake accept echoing the proposed session identifier.
    pub fn handshake_accept(sequence: u32, session_id: u32) -> Self {
        Self::control(
            PacketType::HandshakeAccept,
            sequence,
            session_id.to_le_bytes().to_vec(),
        )
    }

    /// Create a handshake confirm.
    pub fn handshake_confirm(sequence: u32) -> Self {
        Self::control(PacketType::HandshakeConfirm, sequence, Vec::new())
    }

    /// Create a disconnect notification.
    pub fn disconnect(sequence: u32) -> Self {
        Self::control(PacketType::Disconnect, sequence, Vec::new())
    }

    /// Session identifier carried by a handshake request or accept.
    pub fn session_id(&self) -> Option<u32> {
        match self.packet_type {
            PacketType::HandshakeRequest | PacketType::HandshakeAccept => {
                let bytes: [u8; 4] = self.payload.get(..4)?.try_into().ok()?;
                Some(u32::from_le_bytes(bytes))
            }
            _ => None,
        }
    }

    /// Heartbeat echo sequence, when present and non-zero.
    pub fn heartbeat_echo(&self) -> Option<u32> {
        if self.packet_type != PacketType::Heartbeat {
            return None;
        }
        let bytes: [u8; 4] = self.payload.get(..4)?.try_into().ok()?;
        match u32::from_le_bytes(bytes) {
            0 => None,
            echo => Some(echo),
        }
    }

    /// Serialize to the on-wire representation.
    ///
    /// The CRC-32 trailer is appended last, over the fully assembled buffer,
    /// so the checksum always covers the final type, sequence, timestamp and
    /// payload.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        if self.payload.len() > MAX_PAYLOAD {
            return Err(PacketError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_PAYLOAD,
            });
        }

        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE);
        buf.push(self.version);
        buf.push(self.packet_type.as_byte());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.timestamp_us.to_le_bytes());
        buf.extend_from_slice(&(self.payload.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.payload);

        let checksum = crc32fast::hash(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        Ok(buf)
    }

    /// Parse a packet from a received datagram.
    ///
    /// Checksum verification is the first step after length validation; no
    /// field is trusted before it succeeds. Fails with
    /// [`PacketError::Malformed`] when the byte length is inconsistent with
    /// the declared structure, [`PacketError::VersionMismatch`] for an
    /// unsupported version tag, and [`PacketError::Corrupted`] when the CRC
    /// does not match.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < MIN_PACKET_SIZE {
            return Err(PacketError::Malformed("datagram shorter than minimum packet"));
        }

        let (body, trailer) = data.split_at(data.len() - CHECKSUM_SIZE);
        let actual = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let expected = crc32fast::hash(body);
        if expected != actual {
            return Err(PacketError::Corrupted { expected, actual });
        }

        let version = body[0];
        if version != PROTOCOL_VERSION {
            return Err(PacketError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        let packet_type =
            PacketType::from_byte(body[1]).ok_or(PacketError::Malformed("unknown packet type"))?;
        let sequence = u32::from_le_bytes([body[2], body[3], body[4], body[5]]);
        let timestamp_us = u64::from_le_bytes([
            body[6], body[7], body[8], body[9], body[10], body[11], body[12], body[13],
        ]);
        let declared = u16::from_le_bytes([body[14], body[15]]);

        let payload = &body[HEADER_SIZE..];
        if payload.len() != declared as usize {
            return Err(PacketError::Malformed("payload length mismatch"));
        }

        Ok(Self {
            version,
            packet_type,
            sequence,
            timestamp_us,
            payload: payload.to_vec(),
        })
    }

    /// On-wire size of this packet once encoded.
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::MAX_PACKET_SIZE;

    #[test]
    fn test_packet_type_roundtrip() {
        for t in [
            PacketType::HandshakeRequest,
            PacketType::HandshakeAccept,
            PacketType::HandshakeConfirm,
            PacketType::Data,
            PacketType::Heartbeat,
            PacketType::Disconnect,
        ] {
            assert_eq!(PacketType::from_byte(t.as_byte()), Some(t));
        }
        assert_eq!(PacketType::from_byte(0x00), None);
        assert_eq!(PacketType::from_byte(0xFF), None);
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let packet = Packet::data(42, vec![0xDE, 0xAD, 0xBE, 0xEF]);
        let bytes = packet.encode().unwrap();
        assert_eq!(bytes.len(), packet.wire_size());

        let decoded = Packet::decode(&bytes).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let packet = Packet::handshake_confirm(7);
        let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_single_bit_corruption_rejected() {
        let packet = Packet::data(3, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        let clean = packet.encode().unwrap();

        // Flip every bit of the header and payload, one at a time. The CRC
        // trailer itself is exercised separately below.
        for byte_idx in 0..clean.len() - CHECKSUM_SIZE {
            for bit in 0..8 {
                let mut corrupt = clean.clone();
                corrupt[byte_idx] ^= 1 << bit;
                assert!(
                    matches!(Packet::decode(&corrupt), Err(PacketError::Corrupted { .. })),
                    "bit {bit} of byte {byte_idx} accepted after corruption"
                );
            }
        }

        // A flipped trailer bit is also a checksum failure.
        let mut corrupt = clean.clone();
        let last = corrupt.len() - 1;
        corrupt[last] ^= 0x01;
        assert!(matches!(
            Packet::decode(&corrupt),
            Err(PacketError::Corrupted { .. })
        ));
    }

    // Regression test for the checksum-ordering defect: a checksum computed
    // before the packet type was finalized must not survive decode. The
    // checksum is a pure function of the assembled packet, so patching the
    // type byte after encoding invalidates it.
    #[test]
    fn test_checksum_covers_final_packet_type() {
        let heartbeat = Packet::heartbeat(9, 0);
        let mut bytes = heartbeat.encode().unwrap();

        // Retype the encoded packet without recomputing the checksum.
        bytes[1] = PacketType::Data.as_byte();
        assert!(matches!(
            Packet::decode(&bytes),
            Err(PacketError::Corrupted { .. })
        ));

        // Two packets differing only in type must checksum differently.
        let a = Packet {
            packet_type: PacketType::Heartbeat,
            ..Packet::data(1, vec![])
        };
        let b = Packet {
            packet_type: PacketType::Disconnect,
            ..a.clone()
        };
        let crc = |p: &Packet| {
            let encoded = p.encode().unwrap();
            encoded[encoded.len() - CHECKSUM_SIZE..].to_vec()
        };
        assert_ne!(crc(&a), crc(&b));
    }

    #[test]
    fn test_version_mismatch_is_distinct() {
        let mut packet = Packet::data(1, vec![1, 2, 3]);
        packet.version = PROTOCOL_VERSION + 1;
        // Re-encode so the checksum matches the bumped version tag.
        let bytes = packet.encode().unwrap();
        assert_eq!(
            Packet::decode(&bytes),
            Err(PacketError::VersionMismatch {
                expected: PROTOCOL_VERSION,
                actual: PROTOCOL_VERSION + 1,
            })
        );
    }

    #[test]
    fn test_truncated_datagram_malformed() {
        assert!(matches!(
            Packet::decode(&[0u8; MIN_PACKET_SIZE - 1]),
            Err(PacketError::Malformed(_))
        ));
        assert!(matches!(
            Packet::decode(b"xx"),
            Err(PacketError::Malformed(_))
        ));
    }

    #[test]
    fn test_payload_too_large() {
        let packet = Packet::data(1, vec![0u8; MAX_PAYLOAD + 1]);
        assert_eq!(
            packet.encode(),
            Err(PacketError::PayloadTooLarge {
                size: MAX_PAYLOAD + 1,
                max: MAX_PAYLOAD,
            })
        );

        // The largest legal data packet stays within the wire bound.
        let packet = Packet::data(1, vec![0u8; MAX_PAYLOAD]);
        assert_eq!(packet.encode().unwrap().len(), MAX_PACKET_SIZE);
    }

    #[test]
    fn test_handshake_session_id() {
        let request = Packet::handshake_request(1, 0xCAFEBABE);
        assert_eq!(request.session_id(), Some(0xCAFEBABE));

        let accept = Packet::handshake_accept(1, 0xCAFEBABE);
        assert_eq!(accept.session_id(), Some(0xCAFEBABE));

        assert_eq!(Packet::data(1, vec![]).session_id(), None);
    }

    #[test]
    fn test_heartbeat_echo() {
        assert_eq!(Packet::heartbeat(5, 3).heartbeat_echo(), Some(3));
        assert_eq!(Packet::heartbeat(5, 0).heartbeat_echo(), None);
        assert_eq!(Packet::data(5, vec![3, 0, 0, 0]).heartbeat_echo(), None);
    }
}
