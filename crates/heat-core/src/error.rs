//! Error types for the timing core.

use std::fmt;

use thiserror::Error;

use crate::clock::ClockStatus;
use crate::config::Discipline;
use crate::roster::CompetitorId;

/// A clock operation, named for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Start,
    Pause,
    Resume,
    Split,
}

impl Operation {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Split => "split",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors for roster values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("competitor {0} is already on the roster")]
    DuplicateId(CompetitorId),

    #[error("competitor {0} is not on the roster")]
    NotFound(CompetitorId),

    #[error("roster is full ({max} competitors max)")]
    Full { max: usize },

    #[error("position {index} is out of range for a roster of {len}")]
    OutOfRange { index: usize, len: usize },

    #[error("roster has no competitors")]
    NoCompetitors,
}

/// Errors returned by session operations.
///
/// Every rejected operation leaves session state exactly as it was.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimingError {
    /// The targeted clock is not in a state that permits the operation.
    #[error("cannot {operation} {competitor}: clock is {state}")]
    PreconditionViolation {
        competitor: CompetitorId,
        operation: Operation,
        state: ClockStatus,
    },

    /// The clock is idle, but the discipline does not allow starting it yet.
    #[error("cannot start {competitor} yet under {discipline} start")]
    StartNotPermitted {
        competitor: CompetitorId,
        discipline: Discipline,
    },

    #[error("unknown competitor: {0}")]
    UnknownCompetitor(CompetitorId),

    #[error("invalid session configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error(transparent)]
    Roster(#[from] RosterError),
}

impl TimingError {
    /// True for rejections caused by the current session state rather than a caller bug.
    #[must_use]
    pub const fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::PreconditionViolation { .. } | Self::StartNotPermitted { .. }
        )
    }
}

pub type Result<T, E = TimingError> = std::result::Result<T, E>;
