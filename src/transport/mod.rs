//! Packet-level transport over UDP.
//!
//! [`Transport`] binds the codec to a socket: outbound packets are encoded
//! and sent as single datagrams, inbound datagrams are decoded into packets.
//! Decode failures are a property of the network, not of this peer, so they
//! are surfaced in the receive event and counted as dropped rather than
//! raised as errors.

use std::io;
use std::net::SocketAddr;

use tracing::{debug, trace};

use crate::core::error::{LinkResult, PacketError};
use crate::packet::Packet;

pub mod socket;
pub mod stats;
pub mod timing;

pub use socket::LinkSocket;
pub use stats::NetworkStats;
pub use timing::{HeartbeatTracker, RttEstimator};

/// One received datagram, decoded.
#[derive(Debug)]
pub struct RecvEvent {
    /// Sender address of the datagram.
    pub from: SocketAddr,
    /// The decoded packet, or why decoding failed.
    pub result: Result<Packet, PacketError>,
}

/// Datagram transport with send/receive/drop accounting.
#[derive(Debug)]
pub struct Transport {
    socket: LinkSocket,
    packets_sent: u64,
    packets_received: u64,
    packets_dropped: u64,
}

impl Transport {
    /// Bind a transport to the given local address.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        Ok(Self::new(LinkSocket::bind(addr).await?))
    }

    /// Wrap an existing socket.
    pub fn new(socket: LinkSocket) -> Self {
        Self {
            socket,
            packets_sent: 0,
            packets_received: 0,
            packets_dropped: 0,
        }
    }

    /// Local address of the underlying socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Encode and send one packet to `addr`.
    ///
    /// An encode failure is the caller's bug (oversized payload) and comes
    /// back as [`crate::core::error::LinkError::Packet`]; an OS-level send
    /// failure comes back as [`crate::core::error::LinkError::Io`] and is
    /// never retried here.
    pub async fn send(&mut self, packet: &Packet, addr: SocketAddr) -> LinkResult<()> {
        let bytes = packet.encode()?;
        self.socket.send_to(&bytes, addr).await?;
        self.packets_sent += 1;
        trace!(?addr, packet_type = ?packet.packet_type, sequence = packet.sequence, "sent packet");
        Ok(())
    }

    /// Receive the next datagram and decode it.
    ///
    /// Only socket-level failures are returned as `Err`; a datagram that
    /// fails to decode produces a [`RecvEvent`] carrying the codec error
    /// and bumps the dropped counter.
    pub async fn recv(&mut self) -> io::Result<RecvEvent> {
        let (data, from) = self.socket.recv_from().await?;
        let result = Packet::decode(data);
        match &result {
            Ok(packet) => {
                self.packets_received += 1;
                trace!(
                    ?from,
                    packet_type = ?packet.packet_type,
                    sequence = packet.sequence,
                    "received packet"
                );
            }
            Err(error) => {
                self.packets_dropped += 1;
                debug!(?from, %error, "dropped undecodable datagram");
            }
        }
        Ok(RecvEvent { from, result })
    }

    /// Packets sent so far.
    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    /// Packets received and decoded so far.
    pub fn packets_received(&self) -> u64 {
        self.packets_received
    }

    /// Datagrams rejected by the codec so far.
    pub fn packets_dropped(&self) -> u64 {
        self.packets_dropped
    }
}
