//! Per-competitor stopwatch.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!   \        \          /
//!    `--------`--> Finalized
//! ```
//!
//! Idle and Finalized cannot be re-entered. Every operation takes the caller's
//! `now` so one transition always sees a single instant.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Operation, TimingError};
use crate::roster::CompetitorId;
use crate::time::Timestamp;

/// Coarse clock status for display and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockStatus {
    Idle,
    Running,
    Paused,
    Finalized,
}

impl ClockStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for ClockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Running {
        started_at: Timestamp,
        paused_ms: u64,
    },
    Paused {
        started_at: Timestamp,
        paused_ms: u64,
        paused_at: Timestamp,
    },
    /// `elapsed_ms` is `None` when the clock never started.
    Finalized {
        started_at: Option<Timestamp>,
        elapsed_ms: Option<u64>,
    },
}

/// One competitor's elapsed-time measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    competitor: CompetitorId,
    state: State,
    splits: Vec<u64>,
}

impl Clock {
    pub const fn new(competitor: CompetitorId) -> Self {
        Self {
            competitor,
            state: State::Idle,
            splits: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub const fn competitor(&self) -> &CompetitorId {
        &self.competitor
    }

    pub const fn status(&self) -> ClockStatus {
        match self.state {
            State::Idle => ClockStatus::Idle,
            State::Running { .. } => ClockStatus::Running,
            State::Paused { .. } => ClockStatus::Paused,
            State::Finalized { .. } => ClockStatus::Finalized,
        }
    }

    /// The instant of the first start, if there was one.
    pub const fn started_at(&self) -> Option<Timestamp> {
        match self.state {
            State::Idle => None,
            State::Running { started_at, .. } | State::Paused { started_at, .. } => Some(started_at),
            State::Finalized { started_at, .. } => started_at,
        }
    }

    pub const fn has_started(&self) -> bool {
        self.started_at().is_some()
    }

    /// Running or paused.
    pub const fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. } | State::Paused { .. })
    }

    pub const fn is_paused(&self) -> bool {
        matches!(self.state, State::Paused { .. })
    }

    /// Running and not paused.
    pub const fn is_active(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub const fn is_finalized(&self) -> bool {
        matches!(self.state, State::Finalized { .. })
    }

    /// Total paused time so far.
    pub const fn paused_ms(&self) -> u64 {
        match self.state {
            State::Running { paused_ms, .. } | State::Paused { paused_ms, .. } => paused_ms,
            State::Idle | State::Finalized { .. } => 0,
        }
    }

    /// Elapsed running time as seen at `now`, excluding pauses.
    ///
    /// Zero while idle; frozen while paused or finalized.
    pub const fn elapsed_at(&self, now: Timestamp) -> u64 {
        match self.state {
            State::Idle => 0,
            State::Running {
                started_at,
                paused_ms,
            } => now.saturating_since(started_at).saturating_sub(paused_ms),
            State::Paused {
                started_at,
                paused_ms,
                paused_at,
            } => paused_at.saturating_since(started_at).saturating_sub(paused_ms),
            State::Finalized { elapsed_ms, .. } => match elapsed_ms {
                Some(ms) => ms,
                None => 0,
            },
        }
    }

    /// The frozen result. `None` until finalized, and forever `None` for a
    /// clock that never started.
    pub const fn final_elapsed(&self) -> Option<u64> {
        match self.state {
            State::Finalized { elapsed_ms, .. } => elapsed_ms,
            _ => None,
        }
    }

    /// Recorded splits in recording order.
    pub fn splits(&self) -> &[u64] {
        &self.splits
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now: Timestamp) -> Result<(), TimingError> {
        if self.state != State::Idle {
            return Err(self.reject(Operation::Start));
        }
        self.state = State::Running {
            started_at: now,
            paused_ms: 0,
        };
        tracing::debug!(competitor = %self.competitor, at = %now, "clock started");
        Ok(())
    }

    pub fn pause(&mut self, now: Timestamp) -> Result<(), TimingError> {
        let State::Running {
            started_at,
            paused_ms,
        } = self.state
        else {
            return Err(self.reject(Operation::Pause));
        };
        self.state = State::Paused {
            started_at,
            paused_ms,
            paused_at: now,
        };
        tracing::debug!(
            competitor = %self.competitor,
            elapsed_ms = self.elapsed_at(now),
            "clock paused"
        );
        Ok(())
    }

    pub fn resume(&mut self, now: Timestamp) -> Result<(), TimingError> {
        let State::Paused {
            started_at,
            paused_ms,
            paused_at,
        } = self.state
        else {
            return Err(self.reject(Operation::Resume));
        };
        let gap = now.saturating_since(paused_at);
        self.state = State::Running {
            started_at,
            paused_ms: paused_ms.saturating_add(gap),
        };
        tracing::debug!(competitor = %self.competitor, pause_ms = gap, "clock resumed");
        Ok(())
    }

    /// Appends the current elapsed time to the split list and returns it.
    pub fn record_split(&mut self, now: Timestamp) -> Result<u64, TimingError> {
        if !self.is_running() {
            return Err(self.reject(Operation::Split));
        }
        let split = self.elapsed_at(now);
        self.splits.push(split);
        tracing::debug!(
            competitor = %self.competitor,
            split_ms = split,
            count = self.splits.len(),
            "split recorded"
        );
        Ok(split)
    }

    /// Freezes the clock. Idempotent: later calls return the first result.
    ///
    /// A paused clock freezes at its pause instant. A clock that never
    /// started finalizes with no time (DNF).
    pub fn finalize(&mut self, now: Timestamp) -> Option<u64> {
        if let State::Finalized { elapsed_ms, .. } = self.state {
            return elapsed_ms;
        }
        let started_at = self.started_at();
        let elapsed_ms = started_at.map(|_| self.elapsed_at(now));
        self.state = State::Finalized {
            started_at,
            elapsed_ms,
        };
        tracing::debug!(competitor = %self.competitor, ?elapsed_ms, "clock finalized");
        elapsed_ms
    }

    /// Back to idle with splits discarded.
    pub(crate) fn reset(&mut self) {
        self.state = State::Idle;
        self.splits.clear();
    }

    fn reject(&self, operation: Operation) -> TimingError {
        TimingError::PreconditionViolation {
            competitor: self.competitor.clone(),
            operation,
            state: self.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    fn clock() -> Clock {
        Clock::new(CompetitorId::new("anna").unwrap())
    }

    #[test]
    fn idle_clock_reads_zero() {
        let c = clock();
        assert_eq!(c.status(), ClockStatus::Idle);
        assert_eq!(c.elapsed_at(at(9_999)), 0);
        assert!(!c.has_started());
        assert_eq!(c.final_elapsed(), None);
    }

    #[test]
    fn start_pause_resume() {
        let mut c = clock();
        c.start(at(1_000)).unwrap();
        assert_eq!(c.status(), ClockStatus::Running);
        assert_eq!(c.started_at(), Some(at(1_000)));
        assert_eq!(c.elapsed_at(at(4_000)), 3_000);

        c.pause(at(4_000)).unwrap();
        assert_eq!(c.status(), ClockStatus::Paused);
        assert!(c.is_running());
        assert_eq!(c.elapsed_at(at(4_000)), 3_000);
        assert_eq!(c.elapsed_at(at(60_000)), 3_000);

        c.resume(at(9_000)).unwrap();
        assert_eq!(c.paused_ms(), 5_000);
        assert_eq!(c.elapsed_at(at(10_000)), 4_000);
    }

    #[test]
    fn elapsed_never_decreases_while_running() {
        let mut c = clock();
        c.start(at(0)).unwrap();
        let mut last = 0;
        for t in (0..5_000).step_by(137) {
            let e = c.elapsed_at(at(t));
            assert!(e >= last);
            last = e;
        }
    }

    #[test]
    fn instant_pause_resume_costs_nothing() {
        let mut c = clock();
        c.start(at(0)).unwrap();
        c.pause(at(2_500)).unwrap();
        c.resume(at(2_500)).unwrap();
        assert_eq!(c.elapsed_at(at(3_000)), 3_000);
    }

    #[test]
    fn start_only_from_idle() {
        let mut c = clock();
        c.start(at(0)).unwrap();
        let err = c.start(at(10)).unwrap_err();
        assert_eq!(
            err,
            TimingError::PreconditionViolation {
                competitor: CompetitorId::new("anna").unwrap(),
                operation: Operation::Start,
                state: ClockStatus::Running,
            }
        );
        assert_eq!(c.started_at(), Some(at(0)));
    }

    #[test]
    fn pause_and_resume_preconditions() {
        let mut c = clock();
        assert!(c.pause(at(0)).is_err());
        assert!(c.resume(at(0)).is_err());

        c.start(at(0)).unwrap();
        assert!(c.resume(at(1)).is_err());
        c.pause(at(2)).unwrap();
        assert!(c.pause(at(3)).is_err());
        assert_eq!(c.elapsed_at(at(3)), 2);
    }

    #[test]
    fn splits_track_elapsed_and_ignore_pauses() {
        let mut c = clock();
        assert!(c.record_split(at(0)).is_err());

        c.start(at(1_000)).unwrap();
        assert_eq!(c.record_split(at(3_000)).unwrap(), 2_000);
        c.pause(at(4_000)).unwrap();
        assert_eq!(c.record_split(at(8_000)).unwrap(), 3_000);
        c.resume(at(8_000)).unwrap();
        assert_eq!(c.record_split(at(9_000)).unwrap(), 4_000);

        assert_eq!(c.splits(), &[2_000, 3_000, 4_000]);
        assert_eq!(c.status(), ClockStatus::Running);
        assert!(c.splits().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn finalize_running_clock() {
        let mut c = clock();
        c.start(at(0)).unwrap();
        c.pause(at(3_000)).unwrap();
        c.resume(at(8_000)).unwrap();
        assert_eq!(c.finalize(at(10_000)), Some(5_000));
        assert_eq!(c.status(), ClockStatus::Finalized);
        assert!(!c.is_running());
    }

    #[test]
    fn finalize_paused_clock_uses_pause_instant() {
        let mut c = clock();
        c.start(at(0)).unwrap();
        c.pause(at(7_000)).unwrap();
        assert_eq!(c.finalize(at(20_000)), Some(7_000));
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut c = clock();
        c.start(at(0)).unwrap();
        assert_eq!(c.finalize(at(1_000)), Some(1_000));
        assert_eq!(c.finalize(at(5_000)), Some(1_000));
        assert_eq!(c.elapsed_at(at(9_000)), 1_000);
    }

    #[test]
    fn finalize_never_started_is_dnf() {
        let mut c = clock();
        assert_eq!(c.finalize(at(1_000)), None);
        assert_eq!(c.final_elapsed(), None);
        assert!(c.start(at(2_000)).is_err());
    }

    #[test]
    fn finalized_clock_rejects_everything() {
        let mut c = clock();
        c.start(at(0)).unwrap();
        c.record_split(at(500)).unwrap();
        c.finalize(at(1_000));

        assert!(c.start(at(1_100)).is_err());
        assert!(c.pause(at(1_100)).is_err());
        assert!(c.resume(at(1_100)).is_err());
        assert!(c.record_split(at(1_100)).is_err());
        assert_eq!(c.splits(), &[500]);
    }
}
