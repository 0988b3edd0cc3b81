//! Roster files: one competitor name per line, in start order.
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::Path;

use anyhow::{Context, Result};
use heat_core::{Roster, RosterError};

/// Parses roster text into a roster with at most `max_competitors` entries.
pub fn parse_roster(text: &str, max_competitors: usize) -> Result<Roster, RosterError> {
    let names = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));
    let roster = Roster::from_names(names, max_competitors)?;

    if roster.is_empty() {
        return Err(RosterError::NoCompetitors);
    }
    Ok(roster)
}

/// Reads and parses a roster file.
pub fn load_roster(path: &Path, max_competitors: usize) -> Result<Roster> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read roster {}", path.display()))?;
    let roster = parse_roster(&text, max_competitors)
        .with_context(|| format!("invalid roster {}", path.display()))?;
    tracing::debug!(path = %path.display(), competitors = roster.len(), "loaded roster");
    Ok(roster)
}
