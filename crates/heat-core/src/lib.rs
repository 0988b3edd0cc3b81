//! Timing core for multi-competitor heat sessions.
//!
//! This crate contains the fundamental types and logic for:
//! - Clock: one competitor's pausable stopwatch with splits
//! - Registry: one clock per roster competitor plus the start-order policy
//! - Coordinator: manual and automatic-gap start sequencing, and finalizing
//!   a session into results
//!
//! There is no I/O here. Time comes from a [`TimeSource`], and scheduled
//! starts fire when the caller polls the coordinator.

mod clock;
mod config;
mod coordinator;
mod error;
mod registry;
mod results;
pub mod roster;
mod schedule;
pub mod time;

pub use clock::{Clock, ClockStatus};
pub use config::{Discipline, SessionConfig};
pub use coordinator::{ClockView, SessionCoordinator};
pub use error::{Operation, Result, RosterError, TimingError};
pub use registry::TimerRegistry;
pub use results::{ResultOrder, SessionResult, SessionResults, format_elapsed};
pub use roster::{Competitor, CompetitorId, Roster};
pub use schedule::{Countdown, PendingStart, StartChain};
pub use time::{ManualTimeSource, MonotonicTimeSource, TimeSource, Timestamp};
