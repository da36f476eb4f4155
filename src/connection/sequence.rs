//! Data sequence tracking: loss, reordering, and duplicate detection.
//!
//! Sequence numbers wrap: all comparisons use serial arithmetic on `u32`,
//! so the step from `u32::MAX` to `0` is a gap of one, not a reset.

/// Largest reorder tolerance the window can represent.
pub const MAX_REORDER_TOLERANCE: u32 = 64;

/// Classification of one incoming data packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStatus {
    /// At or ahead of the highest sequence seen; deliver.
    InOrder,
    /// Behind the highest sequence but within tolerance and not yet seen;
    /// deliver, flagged as out of order.
    Reordered,
    /// Duplicate or older than the tolerance window; drop.
    Stale,
}

/// Tracks the data sequence stream of one connection.
///
/// Keeps the highest accepted sequence and a 64-bit bitmap of the sequences
/// just below it (bit `i` covers `highest - 1 - i`). A gap ahead counts its
/// missing sequences as lost; a late arrival that fills a gap takes one back
/// off the loss counter and counts as out of order instead.
#[derive(Debug, Clone)]
pub struct SequenceTracker {
    /// Highest sequence accepted so far, `None` before the first packet.
    highest: Option<u32>,
    /// Seen-bitmap for the window below `highest`.
    window: u64,
    /// How far behind `highest` a packet may arrive and still be delivered.
    tolerance: u32,
    /// Packets presumed lost, net of late arrivals.
    lost: u64,
    /// Packets delivered out of order.
    out_of_order: u64,
}

impl SequenceTracker {
    /// Create a tracker. `tolerance` is capped at [`MAX_REORDER_TOLERANCE`].
    pub fn new(tolerance: u32) -> Self {
        Self {
            highest: None,
            window: 0,
            tolerance: tolerance.min(MAX_REORDER_TOLERANCE),
            lost: 0,
            out_of_order: 0,
        }
    }

    /// Classify an incoming sequence number and update the counters.
    pub fn classify(&mut self, sequence: u32) -> SequenceStatus {
        let Some(highest) = self.highest else {
            self.highest = Some(sequence);
            return SequenceStatus::InOrder;
        };

        let delta = sequence.wrapping_sub(highest);
        if delta == 0 {
            return SequenceStatus::Stale;
        }

        if delta <= u32::MAX / 2 {
            // Newer than anything seen; the skipped sequences are presumed
            // lost until a late arrival proves otherwise.
            self.lost += u64::from(delta) - 1;
            self.window = if delta >= 64 {
                if delta == 64 { 1 << 63 } else { 0 }
            } else {
                (self.window << delta) | (1 << (delta - 1))
            };
            self.highest = Some(sequence);
            return SequenceStatus::InOrder;
        }

        // Behind the highest sequence.
        let offset = highest.wrapping_sub(sequence);
        if offset > self.tolerance {
            return SequenceStatus::Stale;
        }
        let bit = 1u64 << (offset - 1);
        if self.window & bit != 0 {
            return SequenceStatus::Stale;
        }

        self.window |= bit;
        self.lost = self.lost.saturating_sub(1);
        self.out_of_order += 1;
        SequenceStatus::Reordered
    }

    /// Packets presumed lost so far.
    pub fn lost(&self) -> u64 {
        self.lost
    }

    /// Packets delivered out of order so far.
    pub fn out_of_order(&self) -> u64 {
        self.out_of_order
    }
}
