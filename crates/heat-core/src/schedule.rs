//! Automatic start chain.
//!
//! The chain holds at most one pending start. Firing a start re-arms the chain
//! for the next roster position, measured from the instant the fired start was
//! *due*, so a late poll never drifts the following starts. One [`StartChain::cancel`]
//! stops every remaining step.

use serde::Serialize;

use crate::roster::CompetitorId;
use crate::time::Timestamp;

/// The single scheduled start, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingStart {
    /// Roster position of the competitor to start.
    pub index: usize,
    pub due_at: Timestamp,
}

/// Countdown to the pending start, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub competitor: CompetitorId,
    /// Whole seconds left, rounded up. Zero exactly when the start is due.
    pub seconds_remaining: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartChain {
    gap_ms: u64,
    roster_len: usize,
    pending: Option<PendingStart>,
}

impl StartChain {
    pub const fn new(gap_ms: u64, roster_len: usize) -> Self {
        Self {
            gap_ms,
            roster_len,
            pending: None,
        }
    }

    pub const fn gap_ms(&self) -> u64 {
        self.gap_ms
    }

    pub const fn pending(&self) -> Option<PendingStart> {
        self.pending
    }

    /// Schedules the successor of `index`, replacing anything pending.
    ///
    /// Returns the new pending start, or `None` when `index` was the last
    /// competitor and the chain has run out.
    pub fn arm(&mut self, index: usize, started_at: Timestamp) -> Option<PendingStart> {
        let next = index + 1;
        self.pending = (next < self.roster_len).then(|| PendingStart {
            index: next,
            due_at: started_at.plus_millis(self.gap_ms),
        });
        self.pending
    }

    /// Removes and returns the pending start if it is due at `now`.
    pub fn take_due(&mut self, now: Timestamp) -> Option<PendingStart> {
        match self.pending {
            Some(p) if p.due_at <= now => self.pending.take(),
            _ => None,
        }
    }

    /// Drops the pending start. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Whole seconds until the pending start, rounded up.
    pub fn seconds_remaining(&self, now: Timestamp) -> Option<u64> {
        self.pending
            .map(|p| p.due_at.saturating_since(now).div_ceil(1_000))
    }
}
