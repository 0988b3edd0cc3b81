//! One clock per roster competitor, plus the start-permission policy.

use std::collections::HashMap;

use crate::clock::Clock;
use crate::config::Discipline;
use crate::error::{Result, TimingError};
use crate::roster::{Competitor, CompetitorId, Roster};
use crate::time::Timestamp;

/// Owns the clocks of a session, keyed by competitor.
///
/// The roster is fixed for the registry's lifetime.
#[derive(Debug, Clone)]
pub struct TimerRegistry {
    roster: Roster,
    discipline: Discipline,
    clocks: HashMap<CompetitorId, Clock>,
}

impl TimerRegistry {
    /// Creates an idle clock for every competitor.
    pub fn new(roster: Roster, discipline: Discipline) -> Self {
        let clocks = roster
            .iter()
            .map(|c| (c.id.clone(), Clock::new(c.id.clone())))
            .collect();
        Self {
            roster,
            discipline,
            clocks,
        }
    }

    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    pub const fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn get(&self, id: &CompetitorId) -> Result<&Clock> {
        self.clocks
            .get(id)
            .ok_or_else(|| TimingError::UnknownCompetitor(id.clone()))
    }

    fn get_mut(&mut self, id: &CompetitorId) -> Result<&mut Clock> {
        self.clocks
            .get_mut(id)
            .ok_or_else(|| TimingError::UnknownCompetitor(id.clone()))
    }

    /// Whether `id` may be started by hand right now.
    ///
    /// Manual: the first competitor always may; anyone else may once their
    /// predecessor has ever started, whether or not it is still running.
    /// Automatic: only the first competitor; the rest are started by the
    /// schedule.
    pub fn can_start(&self, id: &CompetitorId) -> Result<bool> {
        let index = self
            .roster
            .position(id)
            .ok_or_else(|| TimingError::UnknownCompetitor(id.clone()))?;
        if index == 0 {
            return Ok(true);
        }
        match self.discipline {
            Discipline::Manual => {
                let predecessor = &self.roster.competitors()[index - 1];
                Ok(self.get(&predecessor.id)?.has_started())
            }
            Discipline::Automatic => Ok(false),
        }
    }

    /// Starts a clock on a caller's request, enforcing [`Self::can_start`].
    pub fn start(&mut self, id: &CompetitorId, now: Timestamp) -> Result<()> {
        if !self.can_start(id)? {
            return Err(TimingError::StartNotPermitted {
                competitor: id.clone(),
                discipline: self.discipline,
            });
        }
        self.get_mut(id)?.start(now)
    }

    /// Starts a clock from the automatic schedule, bypassing the hand-start policy.
    pub(crate) fn start_scheduled(&mut self, id: &CompetitorId, at: Timestamp) -> Result<()> {
        self.get_mut(id)?.start(at)
    }

    pub fn pause(&mut self, id: &CompetitorId, now: Timestamp) -> Result<()> {
        self.get_mut(id)?.pause(now)
    }

    pub fn resume(&mut self, id: &CompetitorId, now: Timestamp) -> Result<()> {
        self.get_mut(id)?.resume(now)
    }

    pub fn record_split(&mut self, id: &CompetitorId, now: Timestamp) -> Result<u64> {
        self.get_mut(id)?.record_split(now)
    }

    /// Finalizes every running or paused clock at `now`. Idle clocks stay idle.
    pub(crate) fn finalize_running(&mut self, now: Timestamp) -> usize {
        let mut count = 0;
        for clock in self.clocks.values_mut().filter(|c| c.is_running()) {
            clock.finalize(now);
            count += 1;
        }
        count
    }

    pub(crate) fn reset_all(&mut self) {
        for clock in self.clocks.values_mut() {
            clock.reset();
        }
    }

    /// Competitors with their clocks, in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (&Competitor, &Clock)> {
        self.roster
            .iter()
            .filter_map(|c| self.clocks.get(&c.id).map(|clock| (c, clock)))
    }
}
