//! Link statistics counters.

/// Cumulative statistics for a link, as of the last snapshot.
///
/// Snapshots are published by the connection driver; readers always see a
/// coherent set of counters rather than values sampled mid-update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NetworkStats {
    /// Packets sent, all types.
    pub packets_sent: u64,
    /// Packets received and decoded successfully.
    pub packets_received: u64,
    /// Datagrams received but rejected by the codec.
    pub packets_dropped: u64,
    /// Data packets presumed lost (sequence gaps, net of late arrivals).
    pub packets_lost: u64,
    /// Data packets delivered out of order.
    pub packets_out_of_order: u64,
    /// Smoothed round-trip time in milliseconds, 0.0 before any sample.
    /// An upper bound: heartbeat echoes ride the peer's next scheduled
    /// heartbeat, adding up to one heartbeat interval of hold time.
    pub rtt_ms: f64,
    /// RTT variance in milliseconds, a proxy for path jitter.
    pub jitter_ms: f64,
}

impl NetworkStats {
    /// Fraction of data packets presumed lost, in `[0.0, 1.0]`.
    pub fn loss_rate(&self) -> f64 {
        let delivered = self.packets_received + self.packets_lost;
        if delivered == 0 {
            return 0.0;
        }
        self.packets_lost as f64 / delivered as f64
    }

    /// Counters as labelled fields, for structured log export.
    pub fn to_fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("packets_sent", self.packets_sent as f64),
            ("packets_received", self.packets_received as f64),
            ("packets_dropped", self.packets_dropped as f64),
            ("packets_lost", self.packets_lost as f64),
            ("packets_out_of_order", self.packets_out_of_order as f64),
            ("rtt_ms", self.rtt_ms),
            ("jitter_ms", self.jitter_ms),
            ("loss_rate", self.loss_rate()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_rate_empty() {
        assert_eq!(NetworkStats::default().loss_rate(), 0.0);
    }

    #[test]
    fn test_loss_rate() {
        let stats = NetworkStats {
            packets_received: 90,
            packets_lost: 10,
            ..Default::default()
        };
        assert!((stats.loss_rate() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_to_fields_includes_loss_rate() {
        let stats = NetworkStats {
            packets_sent: 5,
            ..Default::default()
        };
        let fields = stats.to_fields();
        assert!(fields.iter().any(|(name, v)| *name == "packets_sent" && *v == 5.0));
        assert!(fields.iter().any(|(name, _)| *name == "loss_rate"));
    }
}
