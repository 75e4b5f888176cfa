//! Ranking engine.
//!
//! Stable sort on one column, then a grouped pass over equal values so
//! tied entities share the rank of the first entity in their group.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{AggregatedEntity, EntityKind, Rank};

/// A sortable table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Name,
    Toi,
    Gf,
    Ga,
    GDiff,
    ShPct,
    SvPct,
    Cf,
    Ca,
    CfPct,
    CfPctAdj,
    Ig,
    Is,
    Ic,
    Ia1,
    Ia2,
    Pts,
    CfOff,
    CaOff,
}

impl SortColumn {
    pub const ALL: [SortColumn; 19] = [
        SortColumn::Name,
        SortColumn::Toi,
        SortColumn::Gf,
        SortColumn::Ga,
        SortColumn::GDiff,
        SortColumn::ShPct,
        SortColumn::SvPct,
        SortColumn::Cf,
        SortColumn::Ca,
        SortColumn::CfPct,
        SortColumn::CfPctAdj,
        SortColumn::Ig,
        SortColumn::Is,
        SortColumn::Ic,
        SortColumn::Ia1,
        SortColumn::Ia2,
        SortColumn::Pts,
        SortColumn::CfOff,
        SortColumn::CaOff,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            SortColumn::Name => "name",
            SortColumn::Toi => "toi",
            SortColumn::Gf => "gf",
            SortColumn::Ga => "ga",
            SortColumn::GDiff => "g_diff",
            SortColumn::ShPct => "sh_pct",
            SortColumn::SvPct => "sv_pct",
            SortColumn::Cf => "cf",
            SortColumn::Ca => "ca",
            SortColumn::CfPct => "cf_pct",
            SortColumn::CfPctAdj => "cf_pct_adj",
            SortColumn::Ig => "ig",
            SortColumn::Is => "is",
            SortColumn::Ic => "ic",
            SortColumn::Ia1 => "ia1",
            SortColumn::Ia2 => "ia2",
            SortColumn::Pts => "pts",
            SortColumn::CfOff => "cf_off",
            SortColumn::CaOff => "ca_off",
        }
    }

    /// Whether the column identifies rather than measures.
    pub fn is_identifier(&self) -> bool {
        matches!(self, SortColumn::Name)
    }

    /// Numeric value of this column, `None` for identifier columns.
    pub fn value(&self, entity: &AggregatedEntity) -> Option<f64> {
        let t = &entity.totals;
        let m = &entity.metrics;
        let v = match self {
            SortColumn::Name => return None,
            SortColumn::Toi => t.toi as f64,
            SortColumn::Gf => t.gf as f64,
            SortColumn::Ga => t.ga as f64,
            SortColumn::GDiff => m.goal_differential as f64,
            SortColumn::ShPct => m.shooting_pct,
            SortColumn::SvPct => m.save_pct,
            SortColumn::Cf => t.cf as f64,
            SortColumn::Ca => t.ca as f64,
            SortColumn::CfPct => m.corsi_pct,
            SortColumn::CfPctAdj => m.corsi_pct_adj,
            SortColumn::Ig => t.ig as f64,
            SortColumn::Is => t.is as f64,
            SortColumn::Ic => t.ic as f64,
            SortColumn::Ia1 => t.ia1 as f64,
            SortColumn::Ia2 => t.ia2 as f64,
            SortColumn::Pts => m.points as f64,
            SortColumn::CfOff => t.cf_off as f64,
            SortColumn::CaOff => t.ca_off as f64,
        };
        Some(v)
    }
}

impl std::fmt::Display for SortColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortColumn::ALL
            .into_iter()
            .find(|c| c.key() == s.trim())
            .ok_or_else(|| format!("unknown sort column: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn flipped(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

/// Current sort column and direction for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self::new(SortColumn::Pts)
    }
}

impl SortState {
    pub fn new(column: SortColumn) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }

    /// Initial state for a table of the given kind.
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Player => Self::new(SortColumn::Pts),
            EntityKind::Team => Self::new(SortColumn::CfPctAdj),
        }
    }

    /// Select a column: the active column flips direction, a new column
    /// starts descending.
    pub fn select(&mut self, column: SortColumn) {
        if column == self.column {
            self.direction = self.direction.flipped();
        } else {
            self.column = column;
            self.direction = SortDirection::Descending;
        }
    }
}

fn compare_names(a: &AggregatedEntity, b: &AggregatedEntity) -> Ordering {
    a.identity
        .name
        .to_lowercase()
        .cmp(&b.identity.name.to_lowercase())
}

/// Sort entities and assign tie-aware ranks.
pub fn rank_entities(mut entities: Vec<AggregatedEntity>, sort: &SortState) -> Vec<AggregatedEntity> {
    let column = sort.column;

    if column.is_identifier() {
        entities.sort_by(|a, b| sort.direction.apply(compare_names(a, b)));
        for entity in &mut entities {
            entity.rank = Rank::unranked();
        }
        return entities;
    }

    // Identifier columns returned above, so every value is present
    let mut keyed: Vec<(f64, AggregatedEntity)> = entities
        .into_iter()
        .map(|e| (column.value(&e).unwrap_or_default(), e))
        .collect();
    keyed.sort_by(|a, b| sort.direction.apply(a.0.total_cmp(&b.0)));

    let mut start = 0;
    while start < keyed.len() {
        let value = keyed[start].0;
        let mut end = start + 1;
        while end < keyed.len() && keyed[end].0.total_cmp(&value) == Ordering::Equal {
            end += 1;
        }
        let is_tied = end - start > 1;
        for (_, entity) in &mut keyed[start..end] {
            entity.rank = Rank::at(start + 1, is_tied);
        }
        start = end;
    }

    keyed.into_iter().map(|(_, e)| e).collect()
}
