//! Wire payloads of the upstream players and teams endpoints.
//!
//! Both endpoints group rows by entity before sending them, one row per
//! distinct (score situation, strength situation) pair.

use serde::{Deserialize, Serialize};

use super::{RawRecord, RawValue};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRows {
    pub player_id: RawValue,
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub data: Vec<RawRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayersPayload {
    pub players: Vec<PlayerRows>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamRows {
    pub team: String,
    #[serde(default)]
    pub data: Vec<RawRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamsPayload {
    pub teams: Vec<TeamRows>,
}
