//! Derived rate statistics.
//!
//! Every ratio with a zero denominator is exactly 0.0, which keeps the
//! results totally ordered for sorting.

use super::StatsError;
use crate::models::{AggregatedEntity, CountingStats, DerivedMetrics, SituationFilter};

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Calculate shooting percentage (goals / shots).
pub fn calculate_shooting_pct(goals: u64, shots: u64) -> f64 {
    ratio(goals as f64, shots as f64)
}

/// Calculate save percentage (1 - goals against / shots against).
pub fn calculate_save_pct(goals_against: u64, shots_against: u64) -> f64 {
    if shots_against == 0 {
        0.0
    } else {
        1.0 - goals_against as f64 / shots_against as f64
    }
}

/// Share of attempts taken by the entity.
pub fn calculate_corsi_pct(corsi_for: f64, corsi_against: f64) -> f64 {
    ratio(corsi_for, corsi_for + corsi_against)
}

/// Goals for minus goals against, `None` if either side is out of range.
fn goal_differential(gf: u64, ga: u64) -> Option<i64> {
    let gf = i64::try_from(gf).ok()?;
    let ga = i64::try_from(ga).ok()?;
    gf.checked_sub(ga)
}

/// Derive rate stats from summed counts.
///
/// Under the `all` filter, goals and shots against while the entity's own
/// net was empty are removed before computing save percentage. Single
/// situation filters use the totals as they are. Fails with the name of
/// the metric whose integer result does not fit.
pub fn derive_metrics(
    totals: &CountingStats,
    own_net_empty: &CountingStats,
    filter: SituationFilter,
) -> Result<DerivedMetrics, &'static str> {
    let (save_ga, save_sa) = if filter.is_all() {
        (
            totals.ga.saturating_sub(own_net_empty.ga),
            totals.sa.saturating_sub(own_net_empty.sa),
        )
    } else {
        (totals.ga, totals.sa)
    };

    let points = totals
        .ig
        .checked_add(totals.ia1)
        .and_then(|n| n.checked_add(totals.ia2))
        .ok_or("pts")?;

    Ok(DerivedMetrics {
        goal_differential: goal_differential(totals.gf, totals.ga).ok_or("g_diff")?,
        points,
        shooting_pct: calculate_shooting_pct(totals.gf, totals.sf),
        save_pct: calculate_save_pct(save_ga, save_sa),
        corsi_pct: calculate_corsi_pct(totals.cf as f64, totals.ca as f64),
        corsi_pct_adj: calculate_corsi_pct(totals.cf_adj, totals.ca_adj),
    })
}

/// Fill in derived metrics for every entity.
pub fn apply_metrics(entities: &mut [AggregatedEntity], filter: SituationFilter) -> Result<(), StatsError> {
    for entity in entities {
        let metrics = derive_metrics(&entity.totals, &entity.own_net_empty, filter).map_err(|field| {
            StatsError::MalformedRecord {
                entity: entity.identity.id.to_string(),
                field: field.to_string(),
                reason: "out of range".to_string(),
            }
        })?;
        entity.metrics = metrics;
    }
    Ok(())
}
