//! Connection configuration.

use std::time::Duration;

use super::constants;

/// Immutable configuration selected at connection creation.
///
/// The presets are value sets, not separate code paths: [`LinkConfig::lan`]
/// for aggressive local-network timeouts, [`LinkConfig::wan`] for tolerant
/// ones, and [`LinkConfig::test_profile`] for accelerated tests.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Local UDP port to bind. `0` picks an ephemeral port; listeners
    /// default to [`constants::DEFAULT_PORT`].
    pub local_port: u16,

    /// Per-attempt handshake timeout.
    pub handshake_timeout: Duration,

    /// Handshake resends after the initial request before giving up.
    pub handshake_retries: u32,

    /// Interval between heartbeats while connected.
    pub heartbeat_interval: Duration,

    /// Missed heartbeat intervals before the peer is declared lost.
    pub heartbeat_miss_threshold: u32,

    /// Depth of the outbound frame queue.
    pub send_queue_depth: usize,

    /// Depth of the caller-facing event queue.
    pub event_queue_depth: usize,

    /// Anti-jitter reorder tolerance, in sequence numbers. Capped at 64.
    pub reorder_tolerance: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            local_port: constants::DEFAULT_PORT,
            handshake_timeout: constants::DEFAULT_HANDSHAKE_TIMEOUT,
            handshake_retries: constants::DEFAULT_HANDSHAKE_RETRIES,
            heartbeat_interval: constants::DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_miss_threshold: constants::DEFAULT_HEARTBEAT_MISS_THRESHOLD,
            send_queue_depth: constants::DEFAULT_SEND_QUEUE_DEPTH,
            event_queue_depth: constants::DEFAULT_EVENT_QUEUE_DEPTH,
            reorder_tolerance: constants::DEFAULT_REORDER_TOLERANCE,
        }
    }
}

impl LinkConfig {
    /// Preset for local networks: short timeouts, fast loss declaration.
    pub fn lan() -> Self {
        Self {
            handshake_timeout: Duration::from_millis(500),
            heartbeat_interval: Duration::from_millis(500),
            ..Self::default()
        }
    }

    /// Preset tolerant of wide-area latency.
    pub fn wan() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(3),
            heartbeat_interval: Duration::from_secs(2),
            heartbeat_miss_threshold: 5,
            ..Self::default()
        }
    }

    /// Accelerated preset for tests.
    pub fn test_profile() -> Self {
        Self {
            local_port: 0,
            handshake_timeout: Duration::from_millis(100),
            handshake_retries: 2,
            heartbeat_interval: Duration::from_millis(100),
            heartbeat_miss_threshold: 3,
            ..Self::default()
        }
    }

    /// Time without any packet from the peer before it is declared lost.
    pub fn peer_timeout(&self) -> Duration {
        self.heartbeat_interval * self.heartbeat_miss_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_ordering() {
        let lan = LinkConfig::lan();
        let wan = LinkConfig::wan();
        let test = LinkConfig::test_profile();

        assert!(lan.heartbeat_interval < wan.heartbeat_interval);
        assert!(lan.handshake_timeout < wan.handshake_timeout);
        assert!(test.handshake_timeout < lan.handshake_timeout);
        assert_eq!(test.handshake_retries, 2);
    }

    #[test]
    fn test_peer_timeout_product() {
        let config = LinkConfig {
            heartbeat_interval: Duration::from_millis(100),
            heartbeat_miss_threshold: 3,
            ..LinkConfig::default()
        };
        assert_eq!(config.peer_timeout(), Duration::from_millis(300));
    }
}
