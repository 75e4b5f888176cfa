//! Strength situations and the situation filter.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Game-state category partitioning ice time.
///
/// The seven variants are mutually exclusive and exhaustive: summing any
/// counting stat across all of them gives the entity's true total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrengthSituation {
    #[serde(rename = "ev5")]
    EvenFive,
    #[serde(rename = "pp")]
    PowerPlay,
    #[serde(rename = "sh")]
    Shorthanded,
    #[serde(rename = "penShot")]
    PenaltyShot,
    /// Opponent's net is empty.
    #[serde(rename = "noOppG")]
    NoOpponentGoalie,
    /// Own net is empty; not a save opportunity.
    #[serde(rename = "noOwnG")]
    NoOwnGoalie,
    #[serde(rename = "other")]
    Other,
}

impl StrengthSituation {
    pub const ALL: [StrengthSituation; 7] = [
        StrengthSituation::EvenFive,
        StrengthSituation::PowerPlay,
        StrengthSituation::Shorthanded,
        StrengthSituation::PenaltyShot,
        StrengthSituation::NoOpponentGoalie,
        StrengthSituation::NoOwnGoalie,
        StrengthSituation::Other,
    ];

    /// Wire label as stored upstream.
    pub fn label(&self) -> &'static str {
        match self {
            StrengthSituation::EvenFive => "ev5",
            StrengthSituation::PowerPlay => "pp",
            StrengthSituation::Shorthanded => "sh",
            StrengthSituation::PenaltyShot => "penShot",
            StrengthSituation::NoOpponentGoalie => "noOppG",
            StrengthSituation::NoOwnGoalie => "noOwnG",
            StrengthSituation::Other => "other",
        }
    }
}

impl std::fmt::Display for StrengthSituation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Unknown strength-situation label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown strength situation: {0}")]
pub struct UnknownSituation(pub String);

impl FromStr for StrengthSituation {
    type Err = UnknownSituation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrengthSituation::ALL
            .into_iter()
            .find(|sit| sit.label() == s.trim())
            .ok_or_else(|| UnknownSituation(s.to_string()))
    }
}

/// Which strength situations an aggregation run sums over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SituationFilter {
    #[default]
    All,
    Only(StrengthSituation),
}

impl SituationFilter {
    /// Resolve the active situation set.
    pub fn situations(&self) -> Vec<StrengthSituation> {
        match self {
            SituationFilter::All => StrengthSituation::ALL.to_vec(),
            SituationFilter::Only(sit) => vec![*sit],
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, SituationFilter::All)
    }
}

impl std::fmt::Display for SituationFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SituationFilter::All => f.write_str("all"),
            SituationFilter::Only(sit) => f.write_str(sit.label()),
        }
    }
}

impl FromStr for SituationFilter {
    type Err = UnknownSituation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "all" {
            Ok(SituationFilter::All)
        } else {
            s.parse().map(SituationFilter::Only)
        }
    }
}

impl Serialize for SituationFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SituationFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
