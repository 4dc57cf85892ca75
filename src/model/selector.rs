//! Quality policy and candidate ordering.

use crate::error::Error;
use crate::model::candidate::MediaCandidate;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Represents which end of the catalog ranking is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Best available stream (lowest rank first)
    #[default]
    Highest,
    /// Worst available stream (highest rank first)
    Lowest,
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "highest" | "high" | "best" | "1" => Ok(Quality::Highest),
            "lowest" | "low" | "worst" | "0" => Ok(Quality::Lowest),
            other => Err(Error::InvalidConfiguration(format!(
                "invalid video quality '{}', expected 'highest' or 'lowest'",
                other
            ))),
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Highest => write!(f, "highest"),
            Quality::Lowest => write!(f, "lowest"),
        }
    }
}

/// Orders candidates by preference rank according to the policy.
///
/// The sort is stable: candidates sharing a rank keep their input order.
pub fn select(mut candidates: Vec<MediaCandidate>, quality: Quality) -> Vec<MediaCandidate> {
    match quality {
        Quality::Highest => candidates.sort_by_key(|c| c.preference()),
        Quality::Lowest => candidates.sort_by(|a, b| b.preference().cmp(&a.preference())),
    }
    candidates
}
