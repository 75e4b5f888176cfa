//! Aggregated entities and their identity.

use serde::{Deserialize, Serialize};

use super::{CountingStats, EntityKind, SituationalRecord};

/// Player identifier or team code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Player(u64),
    Team(String),
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Player(id) => write!(f, "{}", id),
            EntityId::Team(code) => write!(f, "{}", code),
        }
    }
}

/// Descriptive, non-aggregated fields of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityIdentity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    /// Distinct teams seen across all of the entity's records
    pub teams: Vec<String>,
    /// Distinct positions seen across all of the entity's records (players only)
    pub positions: Vec<String>,
}

impl EntityIdentity {
    pub fn player(id: u64, first: &str, last: &str) -> Self {
        let name = format!("{} {}", first.trim(), last.trim()).trim().to_string();
        Self {
            id: EntityId::Player(id),
            kind: EntityKind::Player,
            name,
            teams: Vec::new(),
            positions: Vec::new(),
        }
    }

    pub fn team(code: &str) -> Self {
        let code = code.trim();
        Self {
            id: EntityId::Team(code.to_string()),
            kind: EntityKind::Team,
            name: code.to_uppercase(),
            teams: vec![code.to_string()],
            positions: Vec::new(),
        }
    }

    /// Record a team seen on one of the entity's rows.
    pub fn observe_team(&mut self, team: &str) {
        push_distinct(&mut self.teams, team);
    }

    /// Record a position seen on one of the entity's rows.
    pub fn observe_position(&mut self, position: &str) {
        push_distinct(&mut self.positions, position);
    }
}

fn push_distinct(values: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// One entity's normalized records, as grouped upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecords {
    pub identity: EntityIdentity,
    pub records: Vec<SituationalRecord>,
}

/// Rate statistics derived from summed counts.
///
/// Serialized under the same keys the table sorts by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    #[serde(rename = "g_diff")]
    pub goal_differential: i64,
    #[serde(rename = "pts")]
    pub points: u64,
    #[serde(rename = "sh_pct")]
    pub shooting_pct: f64,
    #[serde(rename = "sv_pct")]
    pub save_pct: f64,
    #[serde(rename = "cf_pct")]
    pub corsi_pct: f64,
    #[serde(rename = "cf_pct_adj")]
    pub corsi_pct_adj: f64,
}

/// Display rank. `position` is `None` when the sort column is an identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub position: Option<usize>,
    pub is_tied: bool,
}

impl Rank {
    pub fn unranked() -> Self {
        Self::default()
    }

    pub fn at(position: usize, is_tied: bool) -> Self {
        Self {
            position: Some(position),
            is_tied,
        }
    }

    /// Label as shown in a table: "", "3" or "T3".
    pub fn label(&self) -> String {
        match self.position {
            None => String::new(),
            Some(p) if self.is_tied => format!("T{}", p),
            Some(p) => p.to_string(),
        }
    }
}

/// One entity after grouping, summation and derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedEntity {
    #[serde(flatten)]
    pub identity: EntityIdentity,
    #[serde(flatten)]
    pub totals: CountingStats,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    /// Contribution of own-net-empty records within the active situations
    #[serde(skip)]
    pub own_net_empty: CountingStats,
    pub rank: Rank,
}

impl AggregatedEntity {
    pub fn new(identity: EntityIdentity, totals: CountingStats, own_net_empty: CountingStats) -> Self {
        Self {
            identity,
            totals,
            metrics: DerivedMetrics::default(),
            own_net_empty,
            rank: Rank::unranked(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_identity_name() {
        let identity = EntityIdentity::player(8478402, "Connor", "McDavid");
        assert_eq!(identity.name, "Connor McDavid");
        assert_eq!(identity.id, EntityId::Player(8478402));
        assert!(identity.teams.is_empty());
    }

    #[test]
    fn test_team_identity() {
        let identity = EntityIdentity::team("edm");
        assert_eq!(identity.name, "EDM");
        assert_eq!(identity.teams, vec!["edm".to_string()]);
    }

    #[test]
    fn test_observe_is_distinct() {
        let mut identity = EntityIdentity::player(1, "A", "B");
        identity.observe_team("tor");
        identity.observe_team("tor");
        identity.observe_team("mtl");
        identity.observe_position("c");
        identity.observe_position("");
        assert_eq!(identity.teams, vec!["tor", "mtl"]);
        assert_eq!(identity.positions, vec!["c"]);
    }

    #[test]
    fn test_rank_label() {
        assert_eq!(Rank::unranked().label(), "");
        assert_eq!(Rank::at(3, false).label(), "3");
        assert_eq!(Rank::at(1, true).label(), "T1");
    }

    #[test]
    fn test_aggregated_entity_serializes_flat() {
        let entity = AggregatedEntity::new(
            EntityIdentity::team("edm"),
            CountingStats {
                gf: 3,
                ..Default::default()
            },
            CountingStats::default(),
        );
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["id"], "edm");
        assert_eq!(json["gf"], 3);
        assert_eq!(json["g_diff"], 0);
        assert!(json.get("own_net_empty").is_none());
        assert_eq!(json["rank"]["is_tied"], false);
    }
}
