//! Session start discipline and gap configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TimingError;

/// How competitors are released onto the course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Discipline {
    /// Each start is triggered by hand, strictly in roster order.
    #[default]
    Manual,
    /// The first start is triggered by hand; the rest follow at a fixed gap.
    Automatic,
}

impl Discipline {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Automatic => "automatic",
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "automatic" | "auto" => Ok(Self::Automatic),
            _ => Err(format!("invalid discipline: {s}")),
        }
    }
}

/// Immutable configuration for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    discipline: Discipline,
    gap_seconds: Option<u32>,
}

impl SessionConfig {
    /// Builds and validates a configuration.
    ///
    /// A gap is required for [`Discipline::Automatic`] and dropped for
    /// [`Discipline::Manual`].
    pub fn new(discipline: Discipline, gap_seconds: Option<u32>) -> Result<Self, TimingError> {
        let config = match discipline {
            Discipline::Manual => Self {
                discipline,
                gap_seconds: None,
            },
            Discipline::Automatic => Self {
                discipline,
                gap_seconds,
            },
        };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub const fn manual() -> Self {
        Self {
            discipline: Discipline::Manual,
            gap_seconds: None,
        }
    }

    pub fn automatic(gap_seconds: u32) -> Result<Self, TimingError> {
        Self::new(Discipline::Automatic, Some(gap_seconds))
    }

    pub fn validate(&self) -> Result<(), TimingError> {
        match (self.discipline, self.gap_seconds) {
            (Discipline::Automatic, None) => Err(TimingError::InvalidConfiguration {
                reason: "automatic start requires a gap".to_string(),
            }),
            (Discipline::Automatic, Some(0)) => Err(TimingError::InvalidConfiguration {
                reason: "gap must be at least one second".to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub const fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub const fn gap_seconds(&self) -> Option<u32> {
        self.gap_seconds
    }

    /// The automatic gap in milliseconds, if any.
    pub fn gap_ms(&self) -> Option<u64> {
        self.gap_seconds.map(|s| u64::from(s) * 1_000)
    }
}
