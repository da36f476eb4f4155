//! Core constants, configuration, and error types.

pub mod config;
pub mod constants;
pub mod error;

pub use config::LinkConfig;
pub use error::{ConnectionError, ErrorReason, LinkError, LinkResult, PacketError};
