//! Session coordinator.
//!
//! Owns the whole state of one timing session as a single value: the
//! registry of clocks, the automatic start chain, and the time source. There
//! is no internal thread. The caller is responsible for calling [`SessionCoordinator::poll`]
//! periodically so scheduled starts fire.
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = SessionCoordinator::new(roster, SessionConfig::automatic(10)?, time)?;
//! session.start(&first)?;
//! // In a loop:
//! session.poll(); // starts whoever is due
//! // Later:
//! let results = session.end_session();
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::clock::{Clock, ClockStatus};
use crate::config::{Discipline, SessionConfig};
use crate::error::{Result, RosterError, TimingError};
use crate::registry::TimerRegistry;
use crate::results::{SessionResult, SessionResults};
use crate::roster::{Competitor, CompetitorId, Roster};
use crate::schedule::{Countdown, StartChain};
use crate::time::{TimeSource, Timestamp};

/// Display state of one competitor's clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockView {
    pub competitor: Competitor,
    pub status: ClockStatus,
    pub elapsed_ms: u64,
    pub splits: Vec<u64>,
    /// Whether a hand start is currently allowed.
    pub can_start: bool,
}

/// Drives one session from first start to finalized results.
#[derive(Debug)]
pub struct SessionCoordinator<T: TimeSource> {
    registry: TimerRegistry,
    config: SessionConfig,
    chain: Option<StartChain>,
    time: T,
    started_at: Option<DateTime<Utc>>,
}

impl<T: TimeSource> SessionCoordinator<T> {
    /// Creates a session with every clock idle.
    ///
    /// The configuration is validated before any clock exists.
    pub fn new(roster: Roster, config: SessionConfig, time: T) -> Result<Self> {
        config.validate()?;
        if roster.is_empty() {
            return Err(RosterError::NoCompetitors.into());
        }
        let chain = match config.discipline() {
            Discipline::Manual => None,
            Discipline::Automatic => {
                let gap_ms = config.gap_ms().ok_or_else(|| TimingError::InvalidConfiguration {
                    reason: "automatic start requires a gap".to_string(),
                })?;
                Some(StartChain::new(gap_ms, roster.len()))
            }
        };
        tracing::debug!(
            competitors = roster.len(),
            discipline = %config.discipline(),
            gap_seconds = ?config.gap_seconds(),
            "session created"
        );
        Ok(Self {
            registry: TimerRegistry::new(roster, config.discipline()),
            config,
            chain,
            time,
            started_at: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub const fn roster(&self) -> &Roster {
        self.registry.roster()
    }

    pub fn now(&self) -> Timestamp {
        self.time.now()
    }

    pub fn clock(&self, id: &CompetitorId) -> Result<&Clock> {
        self.registry.get(id)
    }

    pub fn can_start(&self, id: &CompetitorId) -> Result<bool> {
        self.registry.can_start(id)
    }

    /// First competitor in roster order whose clock never started.
    pub fn next_to_start(&self) -> Option<&Competitor> {
        self.registry
            .iter()
            .find(|(_, clock)| !clock.has_started())
            .map(|(competitor, _)| competitor)
    }

    pub fn any_started(&self) -> bool {
        self.registry.iter().any(|(_, clock)| clock.has_started())
    }

    pub fn all_started(&self) -> bool {
        self.registry.iter().all(|(_, clock)| clock.has_started())
    }

    /// Whether any clock is running and not paused.
    pub fn has_active_clock(&self) -> bool {
        self.registry.iter().any(|(_, clock)| clock.is_active())
    }

    /// Countdown to the pending automatic start, if one is scheduled.
    pub fn countdown(&self) -> Option<Countdown> {
        let chain = self.chain.as_ref()?;
        let pending = chain.pending()?;
        let competitor = self.roster().at(pending.index)?;
        Some(Countdown {
            competitor: competitor.id.clone(),
            seconds_remaining: chain.seconds_remaining(self.time.now())?,
        })
    }

    /// Display state for every competitor, in roster order, at one instant.
    pub fn snapshot(&self) -> Vec<ClockView> {
        let now = self.time.now();
        self.registry
            .iter()
            .map(|(competitor, clock)| ClockView {
                competitor: competitor.clone(),
                status: clock.status(),
                elapsed_ms: clock.elapsed_at(now),
                splits: clock.splits().to_vec(),
                can_start: !clock.has_started()
                    && self.registry.can_start(&competitor.id).unwrap_or(false),
            })
            .collect()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Starts a competitor by hand.
    ///
    /// Under automatic discipline this also arms the chain for the successor.
    pub fn start(&mut self, id: &CompetitorId) -> Result<()> {
        let now = self.time.now();
        self.registry.start(id, now)?;
        self.mark_started();
        self.arm_after(id, now);
        Ok(())
    }

    /// Starts [`Self::next_to_start`]. Returns who was started, or `None`
    /// when everyone already has.
    pub fn start_next(&mut self) -> Result<Option<CompetitorId>> {
        let Some(next) = self.next_to_start().map(|c| c.id.clone()) else {
            return Ok(None);
        };
        self.start(&next)?;
        Ok(Some(next))
    }

    pub fn pause(&mut self, id: &CompetitorId) -> Result<()> {
        let now = self.time.now();
        self.registry.pause(id, now)
    }

    pub fn resume(&mut self, id: &CompetitorId) -> Result<()> {
        let now = self.time.now();
        self.registry.resume(id, now)
    }

    pub fn record_split(&mut self, id: &CompetitorId) -> Result<u64> {
        let now = self.time.now();
        self.registry.record_split(id, now)
    }

    /// Pauses every actively running clock at a single instant.
    ///
    /// Returns the competitors that were paused.
    pub fn pause_all(&mut self) -> Vec<CompetitorId> {
        let now = self.time.now();
        let mut active: Vec<CompetitorId> = self
            .registry
            .iter()
            .filter(|(_, clock)| clock.is_active())
            .map(|(competitor, _)| competitor.id.clone())
            .collect();
        active.retain(|id| self.registry.pause(id, now).is_ok());
        active
    }

    /// Fires every scheduled start that is due. Returns who was started.
    ///
    /// Each start is stamped with the instant it was due, not the instant of
    /// the poll.
    pub fn poll(&mut self) -> Vec<CompetitorId> {
        let now = self.time.now();
        let mut fired = Vec::new();
        while let Some(pending) = self.chain.as_mut().and_then(|c| c.take_due(now)) {
            let Some(id) = self.roster().at(pending.index).map(|c| c.id.clone()) else {
                break;
            };
            match self.registry.start_scheduled(&id, pending.due_at) {
                Ok(()) => {
                    tracing::debug!(competitor = %id, due_at = %pending.due_at, "scheduled start fired");
                    self.mark_started();
                    fired.push(id.clone());
                }
                Err(err) => {
                    tracing::debug!(competitor = %id, error = %err, "scheduled start superseded");
                }
            }
            self.arm_after(&id, pending.due_at);
        }
        if fired.is_empty() {
            tracing::trace!(at = %now, "poll");
        }
        fired
    }

    /// Cancels the pending start and returns every clock to idle.
    ///
    /// Roster and configuration are kept, so the session can be run again.
    pub fn reset(&mut self) {
        if let Some(chain) = self.chain.as_mut() {
            chain.cancel();
        }
        self.registry.reset_all();
        self.started_at = None;
        tracing::debug!("session reset");
    }

    /// Ends the session and produces one result per roster competitor.
    ///
    /// Starts that came due before now fire first; the chain is then
    /// cancelled. Every running or paused clock is finalized before any
    /// result is read, so only never-started competitors report no time.
    pub fn end_session(mut self) -> SessionResults {
        self.poll();
        if self.chain.as_mut().is_some_and(StartChain::cancel) {
            tracing::debug!("pending automatic start cancelled");
        }

        let now = self.time.now();
        let finalized = self.registry.finalize_running(now);

        let results: Vec<SessionResult> = self
            .registry
            .iter()
            .map(|(competitor, clock)| SessionResult {
                competitor_id: competitor.id.clone(),
                name: competitor.name.clone(),
                start_order: competitor.start_order,
                final_elapsed_ms: clock.final_elapsed(),
                splits: clock.splits().to_vec(),
            })
            .collect();

        tracing::debug!(
            finalized,
            dnf = results.iter().filter(|r| r.is_dnf()).count(),
            "session ended"
        );

        SessionResults {
            discipline: self.config.discipline(),
            gap_seconds: self.config.gap_seconds(),
            started_at: self.started_at,
            ended_at: Utc::now(),
            results,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn mark_started(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
    }

    fn arm_after(&mut self, id: &CompetitorId, started_at: Timestamp) {
        let Some(chain) = self.chain.as_mut() else {
            return;
        };
        let Some(index) = self.registry.roster().position(id) else {
            return;
        };
        match chain.arm(index, started_at) {
            Some(pending) => tracing::debug!(
                next_index = pending.index,
                due_at = %pending.due_at,
                "automatic start scheduled"
            ),
            None => tracing::debug!("automatic chain complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ManualTimeSource;

    fn id(s: &str) -> CompetitorId {
        CompetitorId::new(s).unwrap()
    }

    fn roster(names: &[&str]) -> Roster {
        let mut roster = Roster::new();
        for name in names {
            roster.push_with_id(id(name), name).unwrap();
        }
        roster
    }

    fn session(
        names: &[&str],
        config: SessionConfig,
    ) -> (SessionCoordinator<ManualTimeSource>, ManualTimeSource) {
        let time = ManualTimeSource::new();
        let coordinator = SessionCoordinator::new(roster(names), config, time.clone()).unwrap();
        (coordinator, time)
    }

    fn final_times(results: &SessionResults) -> Vec<(String, Option<u64>)> {
        results
            .results
            .iter()
            .map(|r| (r.name.clone(), r.final_elapsed_ms))
            .collect()
    }

    #[test]
    fn empty_roster_is_rejected() {
        let err = SessionCoordinator::new(Roster::new(), SessionConfig::manual(), ManualTimeSource::new())
            .unwrap_err();
        assert_eq!(err, TimingError::Roster(RosterError::NoCompetitors));
    }

    #[test]
    fn manual_session_with_unstarted_competitor() {
        let (mut s, time) = session(&["A", "B", "C"], SessionConfig::manual());

        s.start(&id("A")).unwrap();
        assert!(s.can_start(&id("B")).unwrap());

        time.set(5_000);
        s.start(&id("B")).unwrap();

        time.set(12_000);
        let results = s.end_session();
        assert_eq!(
            final_times(&results),
            vec![
                ("A".to_string(), Some(12_000)),
                ("B".to_string(), Some(7_000)),
                ("C".to_string(), None),
            ]
        );
        assert!(results.started_at.is_some());
    }

    #[test]
    fn automatic_session_starts_successor_after_gap() {
        let (mut s, time) = session(&["A", "B"], SessionConfig::automatic(10).unwrap());

        s.start(&id("A")).unwrap();
        time.set(9_999);
        assert!(s.poll().is_empty());
        assert!(!s.clock(&id("B")).unwrap().has_started());

        time.set(10_000);
        assert_eq!(s.poll(), vec![id("B")]);
        assert_eq!(
            s.clock(&id("B")).unwrap().started_at(),
            Some(Timestamp::from_millis(10_000))
        );

        time.set(15_000);
        let results = s.end_session();
        assert_eq!(
            final_times(&results),
            vec![("A".to_string(), Some(15_000)), ("B".to_string(), Some(5_000))]
        );
    }

    #[test]
    fn automatic_chain_staggers_every_competitor() {
        let (mut s, time) = session(&["A", "B", "C", "D"], SessionConfig::automatic(5).unwrap());
        s.start(&id("A")).unwrap();

        for t in (0..=20_000).step_by(250) {
            time.set(t);
            s.poll();
        }

        let starts: Vec<Option<u64>> = ["A", "B", "C", "D"]
            .iter()
            .map(|n| s.clock(&id(n)).unwrap().started_at().map(Timestamp::as_millis))
            .collect();
        assert_eq!(starts, vec![Some(0), Some(5_000), Some(10_000), Some(15_000)]);
        assert!(s.countdown().is_none());
        assert!(s.all_started());
    }

    #[test]
    fn late_poll_stamps_each_start_at_its_due_instant() {
        let (mut s, time) = session(&["A", "B", "C"], SessionConfig::automatic(10).unwrap());
        s.start(&id("A")).unwrap();

        time.set(25_000);
        assert_eq!(s.poll(), vec![id("B"), id("C")]);
        assert_eq!(s.clock(&id("B")).unwrap().elapsed_at(s.now()), 15_000);
        assert_eq!(s.clock(&id("C")).unwrap().elapsed_at(s.now()), 5_000);
    }

    #[test]
    fn automatic_rejects_hand_start_of_later_competitors() {
        let (mut s, _time) = session(&["A", "B"], SessionConfig::automatic(10).unwrap());
        let err = s.start(&id("B")).unwrap_err();
        assert!(err.is_precondition_violation());

        s.start(&id("A")).unwrap();
        assert!(s.start(&id("B")).is_err());
        assert!(s.start_next().is_err());
    }

    #[test]
    fn countdown_reaches_zero_then_fires() {
        let (mut s, time) = session(&["A", "B"], SessionConfig::automatic(3).unwrap());
        assert!(s.countdown().is_none());
        s.start(&id("A")).unwrap();

        let countdown = s.countdown().unwrap();
        assert_eq!(countdown.competitor, id("B"));
        assert_eq!(countdown.seconds_remaining, 3);

        time.set(2_500);
        assert_eq!(s.countdown().unwrap().seconds_remaining, 1);
        time.set(3_000);
        assert_eq!(s.countdown().unwrap().seconds_remaining, 0);
        s.poll();
        assert!(s.countdown().is_none());
    }

    #[test]
    fn ending_early_cancels_pending_start() {
        let (mut s, time) = session(&["A", "B"], SessionConfig::automatic(10).unwrap());
        s.start(&id("A")).unwrap();
        time.set(4_000);
        let results = s.end_session();
        assert_eq!(
            final_times(&results),
            vec![("A".to_string(), Some(4_000)), ("B".to_string(), None)]
        );
    }

    #[test]
    fn ending_after_a_missed_poll_still_fires_due_start() {
        let (mut s, time) = session(&["A", "B"], SessionConfig::automatic(10).unwrap());
        s.start(&id("A")).unwrap();
        time.set(15_000);
        let results = s.end_session();
        assert_eq!(results.results[1].final_elapsed_ms, Some(5_000));
    }

    #[test]
    fn reset_cancels_chain_and_idles_clocks() {
        let (mut s, time) = session(&["A", "B"], SessionConfig::automatic(10).unwrap());
        s.start(&id("A")).unwrap();
        s.reset();
        assert!(s.countdown().is_none());
        assert!(!s.any_started());

        time.set(30_000);
        assert!(s.poll().is_empty());
        assert!(!s.clock(&id("B")).unwrap().has_started());

        s.start(&id("A")).unwrap();
        assert_eq!(s.countdown().unwrap().competitor, id("B"));
    }

    #[test]
    fn pause_resume_adjusts_final_time() {
        let (mut s, time) = session(&["A"], SessionConfig::manual());
        s.start(&id("A")).unwrap();
        time.set(3_000);
        s.pause(&id("A")).unwrap();
        assert_eq!(s.clock(&id("A")).unwrap().elapsed_at(s.now()), 3_000);
        time.set(8_000);
        s.resume(&id("A")).unwrap();
        assert_eq!(s.clock(&id("A")).unwrap().paused_ms(), 5_000);
        time.set(10_000);
        let results = s.end_session();
        assert_eq!(results.results[0].final_elapsed_ms, Some(5_000));
    }

    #[test]
    fn edge_policy_rejections_leave_state_unchanged() {
        let (mut s, time) = session(&["A", "B"], SessionConfig::manual());
        assert!(s.pause(&id("A")).unwrap_err().is_precondition_violation());
        assert!(s.resume(&id("A")).is_err());

        s.start(&id("A")).unwrap();
        time.set(1_000);
        assert!(s.start(&id("A")).is_err());
        assert!(s.resume(&id("A")).is_err());
        s.pause(&id("A")).unwrap();
        assert!(s.pause(&id("A")).is_err());

        let clock = s.clock(&id("A")).unwrap();
        assert_eq!(clock.started_at(), Some(Timestamp::ZERO));
        assert_eq!(clock.status(), ClockStatus::Paused);
        assert!(matches!(
            s.record_split(&id("nobody")),
            Err(TimingError::UnknownCompetitor(_))
        ));
    }

    #[test]
    fn splits_are_carried_into_results() {
        let (mut s, time) = session(&["A"], SessionConfig::manual());
        s.start(&id("A")).unwrap();
        time.set(1_200);
        assert_eq!(s.record_split(&id("A")).unwrap(), 1_200);
        time.set(2_900);
        assert_eq!(s.record_split(&id("A")).unwrap(), 2_900);
        time.set(4_000);
        let results = s.end_session();
        assert_eq!(results.results[0].splits, vec![1_200, 2_900]);
    }

    #[test]
    fn nobody_started_means_everyone_dnf() {
        let (s, _time) = session(&["A", "B", "C"], SessionConfig::manual());
        let results = s.end_session();
        assert!(results.results.iter().all(SessionResult::is_dnf));
        assert!(results.started_at.is_none());
    }

    #[test]
    fn start_next_walks_the_roster() {
        let (mut s, _time) = session(&["A", "B"], SessionConfig::manual());
        assert_eq!(s.start_next().unwrap(), Some(id("A")));
        assert_eq!(s.start_next().unwrap(), Some(id("B")));
        assert_eq!(s.start_next().unwrap(), None);
    }

    #[test]
    fn pause_all_pauses_only_active_clocks() {
        let (mut s, time) = session(&["A", "B", "C"], SessionConfig::manual());
        s.start(&id("A")).unwrap();
        s.start(&id("B")).unwrap();
        time.set(1_000);
        s.pause(&id("B")).unwrap();
        assert!(s.has_active_clock());

        time.set(2_000);
        assert_eq!(s.pause_all(), vec![id("A")]);
        assert!(!s.has_active_clock());
        assert_eq!(s.clock(&id("A")).unwrap().elapsed_at(s.now()), 2_000);
    }

    #[test]
    fn snapshot_reports_display_state() {
        let (mut s, time) = session(&["A", "B", "C"], SessionConfig::manual());
        s.start(&id("A")).unwrap();
        time.set(1_500);

        let views = s.snapshot();
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].status, ClockStatus::Running);
        assert_eq!(views[0].elapsed_ms, 1_500);
        assert!(!views[0].can_start);
        assert!(views[1].can_start);
        assert!(!views[2].can_start);
        assert_eq!(views[2].competitor.start_order, 2);
    }
}
