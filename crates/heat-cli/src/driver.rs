//! Line-command interpreter for a running session.
//!
//! Each input line is one command. Rejected operations are reported to the
//! writer and the session carries on; only I/O failures end it early.

use std::io::Write;
use std::str::FromStr;

use anyhow::Result;
use heat_core::{CompetitorId, SessionCoordinator, SessionResults, TimeSource};

use crate::render;

const HELP: &str = "\
commands:
  start <who>   start a competitor (position, name or id)
  next          start the next competitor in order
  pause <who>   pause a running clock
  resume <who>  resume a paused clock
  split <who>   record a split
  pause-all     pause every running clock
  status        show all clocks
  reset         stop everything and return all clocks to idle
  end           finish the session and show results";

/// A parsed session command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Start(String),
    Next,
    Pause(String),
    Resume(String),
    Split(String),
    PauseAll,
    Status,
    Reset,
    End,
    Help,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let target = rest.trim();
        let needs_target = |make: fn(String) -> Self| {
            if target.is_empty() {
                Err(format!("{verb} needs a competitor"))
            } else {
                Ok(make(target.to_string()))
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "start" | "s" => needs_target(Self::Start),
            "next" | "n" => Ok(Self::Next),
            "pause" | "p" => needs_target(Self::Pause),
            "resume" | "r" => needs_target(Self::Resume),
            "split" | "l" => needs_target(Self::Split),
            "pause-all" | "stop-all" => Ok(Self::PauseAll),
            "status" | "ls" => Ok(Self::Status),
            "reset" => Ok(Self::Reset),
            "end" | "results" | "quit" | "q" => Ok(Self::End),
            "help" | "?" => Ok(Self::Help),
            _ => Err(format!("unknown command: {verb} (try 'help')")),
        }
    }
}

/// Whether the session should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    End,
}

/// Applies commands to a session and reports what happened.
pub struct SessionDriver<T: TimeSource> {
    session: SessionCoordinator<T>,
    last_countdown: Option<(CompetitorId, u64)>,
}

impl<T: TimeSource> SessionDriver<T> {
    pub const fn new(session: SessionCoordinator<T>) -> Self {
        Self {
            session,
            last_countdown: None,
        }
    }

    pub const fn session(&self) -> &SessionCoordinator<T> {
        &self.session
    }

    /// Handles one input line.
    pub fn handle<W: Write>(&mut self, line: &str, writer: &mut W) -> Result<Flow> {
        if line.trim().is_empty() {
            return Ok(Flow::Continue);
        }
        let command = match line.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(message) => {
                writeln!(writer, "error: {message}")?;
                return Ok(Flow::Continue);
            }
        };
        tracing::debug!(?command, "session command");

        // Fire anything already due so commands see an up-to-date session.
        self.tick(writer)?;

        match command {
            SessionCommand::Start(who) => {
                if let Some(id) = self.resolve_or_report(&who, writer)? {
                    match self.session.start(&id) {
                        Ok(()) => self.announce(writer, "started", &id)?,
                        Err(err) => writeln!(writer, "error: {err}")?,
                    }
                }
            }
            SessionCommand::Next => match self.session.start_next() {
                Ok(Some(id)) => self.announce(writer, "started", &id)?,
                Ok(None) => writeln!(writer, "everyone has started")?,
                Err(err) => writeln!(writer, "error: {err}")?,
            },
            SessionCommand::Pause(who) => {
                if let Some(id) = self.resolve_or_report(&who, writer)? {
                    match self.session.pause(&id) {
                        Ok(()) => self.announce(writer, "paused", &id)?,
                        Err(err) => writeln!(writer, "error: {err}")?,
                    }
                }
            }
            SessionCommand::Resume(who) => {
                if let Some(id) = self.resolve_or_report(&who, writer)? {
                    match self.session.resume(&id) {
                        Ok(()) => self.announce(writer, "resumed", &id)?,
                        Err(err) => writeln!(writer, "error: {err}")?,
                    }
                }
            }
            SessionCommand::Split(who) => {
                if let Some(id) = self.resolve_or_report(&who, writer)? {
                    match self.session.record_split(&id) {
                        Ok(split) => writeln!(
                            writer,
                            "split {} {}",
                            self.name_of(&id),
                            heat_core::format_elapsed(split)
                        )?,
                        Err(err) => writeln!(writer, "error: {err}")?,
                    }
                }
            }
            SessionCommand::PauseAll => {
                let paused = self.session.pause_all();
                if paused.is_empty() {
                    writeln!(writer, "no running clocks")?;
                }
                for id in &paused {
                    self.announce(writer, "paused", id)?;
                }
            }
            SessionCommand::Status => {
                render::write_status(
                    writer,
                    &self.session.snapshot(),
                    self.session.countdown().as_ref(),
                    self.session.roster(),
                )?;
            }
            SessionCommand::Reset => {
                self.session.reset();
                self.last_countdown = None;
                writeln!(writer, "session reset")?;
            }
            SessionCommand::Help => writeln!(writer, "{HELP}")?,
            SessionCommand::End => return Ok(Flow::End),
        }
        Ok(Flow::Continue)
    }

    /// Periodic refresh: fires due starts and reports countdown changes.
    ///
    /// A due start shows as `0s` before it fires.
    pub fn tick<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        self.report_countdown(writer)?;
        for id in self.session.poll() {
            self.announce(writer, "started", &id)?;
        }
        self.report_countdown(writer)
    }

    fn report_countdown<W: Write>(&mut self, writer: &mut W) -> Result<()> {
        let countdown = self.session.countdown();
        let current = countdown
            .as_ref()
            .map(|c| (c.competitor.clone(), c.seconds_remaining));
        if current != self.last_countdown {
            if let Some(countdown) = &countdown {
                render::write_countdown(writer, countdown, self.session.roster())?;
            }
            self.last_countdown = current;
        }
        Ok(())
    }

    /// Ends the session and returns its results.
    pub fn finish(self) -> SessionResults {
        self.session.end_session()
    }

    /// Resolves a 1-based position, a name (case-insensitive) or an ID.
    pub fn resolve(&self, who: &str) -> Option<CompetitorId> {
        let roster = self.session.roster();
        let who = who.trim();
        let by_position = who
            .parse::<usize>()
            .ok()
            .and_then(|position| position.checked_sub(1))
            .and_then(|index| roster.at(index));
        by_position
            .or_else(|| roster.iter().find(|c| c.id.as_str() == who))
            .or_else(|| roster.iter().find(|c| c.name.eq_ignore_ascii_case(who)))
            .map(|c| c.id.clone())
    }

    fn resolve_or_report<W: Write>(&self, who: &str, writer: &mut W) -> Result<Option<CompetitorId>> {
        let id = self.resolve(who);
        if id.is_none() {
            writeln!(writer, "error: no competitor matches '{who}'")?;
        }
        Ok(id)
    }

    fn name_of(&self, id: &CompetitorId) -> String {
        self.session
            .roster()
            .get(id)
            .map_or_else(|| id.to_string(), |c| c.name.clone())
    }

    fn announce<W: Write>(&self, writer: &mut W, verb: &str, id: &CompetitorId) -> Result<()> {
        let elapsed = self
            .session
            .clock(id)
            .map(|clock| clock.elapsed_at(self.session.now()))
            .unwrap_or_default();
        writeln!(
            writer,
            "{verb} {} at {}",
            self.name_of(id),
            heat_core::format_elapsed(elapsed)
        )?;
        Ok(())
    }
}
