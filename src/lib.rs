//! # Voicelink
//!
//! Peer-to-peer low-latency voice transport over UDP.
//!
//! Voicelink moves opaque compressed audio frames between exactly two peers.
//! It deliberately trades reliability for latency: frames are never
//! retransmitted, late frames are worth less than silence, and the layer's
//! job is to tell the application the truth about what arrived rather than
//! to guarantee arrival. It provides:
//!
//! - **Integrity**: every packet carries a CRC-32; corruption is dropped,
//!   never delivered
//! - **Sequencing**: loss, reordering, and duplicates are detected and
//!   reported, with serial arithmetic across sequence wraparound
//! - **Liveness**: a three-way handshake, periodic heartbeats, and timeout
//!   detection on both sides
//! - **Telemetry**: RTT and jitter estimated over the heartbeat echo
//!   exchange, loss counters per connection
//!
//! ## Modules
//!
//! - [`core`]: constants, configuration, and error types
//! - [`packet`]: the wire codec
//! - [`transport`]: UDP socket plumbing, RTT estimation, statistics
//! - [`connection`]: the sans-IO connection state machine
//! - [`manager`]: the async driver and caller-facing API
//!
//! ## Example Usage
//!
//! ```no_run
//! use voicelink::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> LinkResult<()> {
//!     let (handle, mut events) =
//!         LinkManager::connect(LinkConfig::lan(), "192.168.1.20:9001".parse().unwrap()).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         match event {
//!             LinkEvent::Connected { peer, session_id } => {
//!                 println!("connected to {peer} (session {session_id:08x})");
//!                 handle.send_frame(vec![0u8; 160])?;
//!             }
//!             LinkEvent::Frame { payload, .. } => {
//!                 // Hand the opaque frame to the audio decoder.
//!                 let _ = payload;
//!             }
//!             LinkEvent::Disconnected | LinkEvent::Error(_) => break,
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connection;
pub mod core;
pub mod manager;
pub mod packet;
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::connection::{LinkState, Role, SequenceStatus, SequenceTracker};
    pub use crate::core::config::LinkConfig;
    pub use crate::core::error::{
        ConnectionError, ErrorReason, LinkError, LinkResult, PacketError,
    };
    pub use crate::manager::{LinkEvent, LinkEvents, LinkHandle, LinkManager};
    pub use crate::packet::{Packet, PacketType};
    pub use crate::transport::{NetworkStats, RttEstimator};
}

// Re-export commonly used items at crate root
pub use crate::connection::{Connection, LinkState};
pub use crate::core::config::LinkConfig;
pub use crate::core::error::{ConnectionError, ErrorReason, LinkError, LinkResult, PacketError};
pub use crate::manager::{LinkEvent, LinkEvents, LinkHandle, LinkManager};
pub use crate::packet::{Packet, PacketType};
pub use crate::transport::NetworkStats;
