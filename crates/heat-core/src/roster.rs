//! Competitors and the ordered start list.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RosterError;

/// Largest roster accepted by default.
pub const DEFAULT_MAX_COMPETITORS: usize = 30;

/// A validated competitor identifier.
///
/// IDs must be non-empty and unique within a roster.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompetitorId(String);

impl CompetitorId {
    /// Creates a new ID after validation.
    pub fn new(id: impl Into<String>) -> Result<Self, RosterError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RosterError::Empty {
                field: "competitor ID",
            });
        }
        Ok(Self(id))
    }

    /// Generates a fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CompetitorId {
    type Error = RosterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CompetitorId> for String {
    fn from(id: CompetitorId) -> Self {
        id.0
    }
}

impl fmt::Display for CompetitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CompetitorId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One entry on the start list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
    /// Zero-based position on the roster. Always matches list position.
    pub start_order: usize,
}

/// Ordered list of competitors.
///
/// Every mutation renumbers `start_order` so it stays a dense `0..n` sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    competitors: Vec<Competitor>,
    max_competitors: usize,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    pub const fn new() -> Self {
        Self::with_limit(DEFAULT_MAX_COMPETITORS)
    }

    pub const fn with_limit(max_competitors: usize) -> Self {
        Self {
            competitors: Vec::new(),
            max_competitors,
        }
    }

    /// Builds a roster from names in start order.
    ///
    /// Each competitor gets a readable ID derived from the name
    /// (`Anna Berg` -> `anna-berg`), with a `-2`, `-3` suffix on collision.
    /// Names without letters or digits get a generated ID.
    pub fn from_names<I, S>(names: I, max_competitors: usize) -> Result<Self, RosterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roster = Self::with_limit(max_competitors);
        for name in names {
            let name = name.as_ref();
            let id = slug(name).map_or_else(CompetitorId::generate, |base| roster.unused_id(&base));
            roster.push_with_id(id, name)?;
        }
        Ok(roster)
    }

    /// Appends a competitor with a caller-chosen ID.
    pub fn push_with_id(&mut self, id: CompetitorId, name: &str) -> Result<&Competitor, RosterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RosterError::Empty {
                field: "competitor name",
            });
        }
        if self.competitors.len() >= self.max_competitors {
            return Err(RosterError::Full {
                max: self.max_competitors,
            });
        }
        if self.contains(&id) {
            return Err(RosterError::DuplicateId(id));
        }

        let start_order = self.competitors.len();
        self.competitors.push(Competitor {
            id,
            name: name.to_string(),
            start_order,
        });
        Ok(&self.competitors[start_order])
    }

    /// Removes a competitor, closing the gap in start order.
    pub fn remove(&mut self, id: &CompetitorId) -> Option<Competitor> {
        let index = self.position(id)?;
        let removed = self.competitors.remove(index);
        self.renumber();
        Some(removed)
    }

    /// Moves a competitor to `index`, shifting the others.
    pub fn move_to(&mut self, id: &CompetitorId, index: usize) -> Result<(), RosterError> {
        let len = self.competitors.len();
        if index >= len {
            return Err(RosterError::OutOfRange { index, len });
        }
        let from = self
            .position(id)
            .ok_or_else(|| RosterError::NotFound(id.clone()))?;

        let moved = self.competitors.remove(from);
        self.competitors.insert(index, moved);
        self.renumber();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.competitors.clear();
    }

    pub fn len(&self) -> usize {
        self.competitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.competitors.is_empty()
    }

    pub const fn max_competitors(&self) -> usize {
        self.max_competitors
    }

    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Competitor> {
        self.competitors.iter()
    }

    pub fn get(&self, id: &CompetitorId) -> Option<&Competitor> {
        self.competitors.iter().find(|c| &c.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Competitor> {
        self.competitors.get(index)
    }

    pub fn position(&self, id: &CompetitorId) -> Option<usize> {
        self.competitors.iter().position(|c| &c.id == id)
    }

    pub fn contains(&self, id: &CompetitorId) -> bool {
        self.position(id).is_some()
    }

    fn unused_id(&self, base: &str) -> CompetitorId {
        let mut candidate = CompetitorId(base.to_string());
        let mut n = 2;
        while self.contains(&candidate) {
            candidate = CompetitorId(format!("{base}-{n}"));
            n += 1;
        }
        candidate
    }

    fn renumber(&mut self) {
        for (index, competitor) in self.competitors.iter_mut().enumerate() {
            competitor.start_order = index;
        }
    }
}

/// Lowercase, dash-separated form of `name`, or `None` if nothing is left.
fn slug(name: &str) -> Option<String> {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Competitor;
    type IntoIter = std::slice::Iter<'a, Competitor>;

    fn into_iter(self) -> Self::IntoIter {
        self.competitors.iter()
    }
}
