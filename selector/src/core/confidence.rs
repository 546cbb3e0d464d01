//! Target confidence levels passed to the model as a prompt parameter.

use std::fmt;
use std::str::FromStr;

use anyhow::{Error, anyhow};

/// How sure the model should be that its selection covers every affected test.
///
/// Variants are declared in ascending order so the derived `Ord` matches the
/// order in which levels are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfidenceLevel {
    P80,
    P95,
    P99,
    P999,
}

impl ConfidenceLevel {
    /// All levels, ascending.
    pub const ALL: [ConfidenceLevel; 4] = [Self::P80, Self::P95, Self::P99, Self::P999];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P80 => "80",
            Self::P95 => "95",
            Self::P99 => "99",
            Self::P999 => "99.9",
        }
    }

    /// Short phrase describing how broad the selection should be.
    pub fn description(self) -> &'static str {
        match self {
            Self::P80 => "the tests most directly exercising the changed code",
            Self::P95 => "the directly affected tests plus their close collaborators",
            Self::P99 => "every test with a plausible dependency on the changed code",
            Self::P999 => "every test that could conceivably be affected, erring on inclusion",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_str())
    }
}

impl FromStr for ConfidenceLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed);
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == trimmed)
            .ok_or_else(|| anyhow!("unknown confidence level '{s}' (expected 80, 95, 99 or 99.9)"))
    }
}
