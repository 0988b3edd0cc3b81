//! Finalized session results.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Discipline;
use crate::roster::CompetitorId;

/// One competitor's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    pub competitor_id: CompetitorId,
    pub name: String,
    pub start_order: usize,
    /// Final elapsed time. `None` means the competitor never started (DNF).
    pub final_elapsed_ms: Option<u64>,
    pub splits: Vec<u64>,
}

impl SessionResult {
    pub const fn is_dnf(&self) -> bool {
        self.final_elapsed_ms.is_none()
    }
}

/// How to order a results listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResultOrder {
    /// Roster order.
    #[default]
    Start,
    /// Fastest first, DNF last.
    Time,
}

impl ResultOrder {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Time => "time",
        }
    }
}

impl fmt::Display for ResultOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "time" => Ok(Self::Time),
            _ => Err(format!("invalid result order: {s}")),
        }
    }
}

/// Everything a finished session produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResults {
    pub discipline: Discipline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_seconds: Option<u32>,
    /// Wall-clock time of the first start, if anyone started.
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    /// One entry per roster competitor, in roster order.
    pub results: Vec<SessionResult>,
}

impl SessionResults {
    /// Results sorted for display. Sorting is stable, so ties keep start order.
    pub fn ordered(&self, order: ResultOrder) -> Vec<&SessionResult> {
        let mut sorted: Vec<&SessionResult> = self.results.iter().collect();
        match order {
            ResultOrder::Start => sorted.sort_by_key(|r| r.start_order),
            ResultOrder::Time => sorted.sort_by(|a, b| by_finish_time(a, b)),
        }
        sorted
    }

    pub fn finished(&self) -> usize {
        self.results.iter().filter(|r| !r.is_dnf()).count()
    }
}

fn by_finish_time(a: &SessionResult, b: &SessionResult) -> Ordering {
    match (a.final_elapsed_ms, b.final_elapsed_ms) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Formats milliseconds as `MM:SS.cc` (centiseconds truncated).
pub fn format_elapsed(ms: u64) -> String {
    let total_seconds = ms / 1_000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let centis = (ms % 1_000) / 10;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}
