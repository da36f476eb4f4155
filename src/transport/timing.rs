//! RTT estimation and heartbeat echo tracking.
//!
//! RTT is measured over the heartbeat exchange: each heartbeat echoes the
//! sequence number of the last heartbeat received from the peer, and an
//! echo matching our pending heartbeat yields one RTT sample. Samples feed
//! an RFC 6298 smoothed estimator; the variance term doubles as a jitter
//! estimate for the stats snapshot.

use std::time::{Duration, Instant};

/// RTT smoothing constants.
pub mod constants {
    /// Alpha for SRTT smoothing (0.125 = 1/8).
    pub const SRTT_ALPHA: f64 = 0.125;

    /// Beta for RTTVAR smoothing (0.25 = 1/4).
    pub const RTTVAR_BETA: f64 = 0.25;
}

/// Smoothed RTT estimator (RFC 6298 SRTT/RTTVAR, no RTO).
///
/// There is no retransmission in this protocol, so the estimator keeps only
/// the smoothed RTT and its variance.
#[derive(Debug, Clone)]
pub struct RttEstimator {
    /// Smoothed RTT in milliseconds.
    srtt: f64,
    /// RTT variance in milliseconds.
    rttvar: f64,
    /// Whether we've received the first RTT sample.
    initialized: bool,
}

impl Default for RttEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl RttEstimator {
    /// Create a new RTT estimator with no samples.
    pub fn new() -> Self {
        Self {
            srtt: 0.0,
            rttvar: 0.0,
            initialized: false,
        }
    }

    /// Update the estimate with a new sample.
    ///
    /// - First measurement: SRTT = sample, RTTVAR = sample / 2
    /// - Subsequent: RTTVAR = 0.75 * RTTVAR + 0.25 * |SRTT - sample|,
    ///   SRTT = 0.875 * SRTT + 0.125 * sample
    pub fn update(&mut self, sample: Duration) {
        let sample_ms = sample.as_secs_f64() * 1000.0;

        if !self.initialized {
            self.srtt = sample_ms;
            self.rttvar = sample_ms / 2.0;
            self.initialized = true;
        } else {
            self.rttvar = (1.0 - constants::RTTVAR_BETA) * self.rttvar
                + constants::RTTVAR_BETA * (self.srtt - sample_ms).abs();
            self.srtt =
                (1.0 - constants::SRTT_ALPHA) * self.srtt + constants::SRTT_ALPHA * sample_ms;
        }
    }

    /// Current smoothed RTT in milliseconds, 0.0 before any sample.
    ///
    /// Heartbeat echoes ride the peer's next scheduled heartbeat, so each
    /// sample includes up to one heartbeat interval of hold time on the
    /// peer. Read the estimate as an upper bound on the network RTT, not a
    /// point measurement.
    pub fn srtt_ms(&self) -> f64 {
        self.srtt
    }

    /// Current RTT variance in milliseconds, used as the jitter estimate.
    pub fn jitter_ms(&self) -> f64 {
        self.rttvar
    }

    /// Whether at least one sample has been recorded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// Tracks the heartbeat sequence echo exchange for RTT measurement.
///
/// At most one heartbeat is outstanding: sending a new one overwrites the
/// pending record, so an echo of an older heartbeat is simply ignored and
/// its sample lost. Losing samples is fine; pairing a stale echo with a
/// fresh send time is not.
#[derive(Debug, Clone)]
pub struct HeartbeatTracker {
    /// Last heartbeat sequence received from the peer (0 = none yet).
    last_peer_heartbeat: u32,
    /// Our heartbeat sequence awaiting an echo.
    pending_sequence: Option<u32>,
    /// When the pending heartbeat was sent.
    pending_sent_at: Option<Instant>,
}

impl HeartbeatTracker {
    /// Create a new tracker with no heartbeats seen.
    pub fn new() -> Self {
        Self {
            last_peer_heartbeat: 0,
            pending_sequence: None,
            pending_sent_at: None,
        }
    }

    /// Echo value to carry in our next heartbeat (0 = nothing to echo).
    pub fn echo(&self) -> u32 {
        self.last_peer_heartbeat
    }

    /// Record a heartbeat we just sent.
    pub fn on_send(&mut self, sequence: u32, now: Instant) {
        self.pending_sequence = Some(sequence);
        self.pending_sent_at = Some(now);
    }

    /// Record a heartbeat received from the peer.
    pub fn on_peer_heartbeat(&mut self, sequence: u32) {
        self.last_peer_heartbeat = sequence;
    }

    /// Process the echo field of a received heartbeat.
    ///
    /// Returns an RTT sample when the echo matches our pending heartbeat.
    pub fn on_echo(&mut self, echo: u32, now: Instant) -> Option<Duration> {
        if let (Some(pending), Some(sent_at)) = (self.pending_sequence, self.pending_sent_at)
            && echo == pending
        {
            self.pending_sequence = None;
            self.pending_sent_at = None;
            return Some(now.saturating_duration_since(sent_at));
        }
        None
    }
}

impl Default for HeartbeatTracker {
    fn default() -> Self {
        Self::new()
    }
}
