//! Aggregation engine.
//!
//! Groups normalized records by entity and sums counting stats over the
//! active strength situations.

use std::collections::HashMap;

use tracing::debug;

use super::StatsError;
use crate::models::{
    AggregatedEntity, CountingStats, EntityId, EntityRecords, SituationFilter, StrengthSituation,
};

/// Merge entries that share an entity id, keeping first-seen order.
pub fn group_by_entity(entities: &[EntityRecords]) -> Vec<EntityRecords> {
    let mut index: HashMap<&EntityId, usize> = HashMap::new();
    let mut grouped: Vec<EntityRecords> = Vec::with_capacity(entities.len());

    for entity in entities {
        match index.get(&entity.identity.id) {
            Some(&i) => {
                let target = &mut grouped[i];
                for team in &entity.identity.teams {
                    target.identity.observe_team(team);
                }
                for position in &entity.identity.positions {
                    target.identity.observe_position(position);
                }
                target.records.extend(entity.records.iter().cloned());
            }
            None => {
                index.insert(&entity.identity.id, grouped.len());
                grouped.push(entity.clone());
            }
        }
    }

    grouped
}

/// Sum one entity's records over the active situations.
///
/// Descriptive fields come from every record regardless of the filter; an
/// entity with no records in the active set yields all-zero sums. A sum
/// that overflows is reported as a malformed record.
pub fn aggregate_entity(
    entity: &EntityRecords,
    filter: SituationFilter,
) -> Result<AggregatedEntity, StatsError> {
    let active = filter.situations();
    let mut identity = entity.identity.clone();
    let mut totals = CountingStats::default();
    let mut own_net_empty = CountingStats::default();

    let overflow = |field: &str| StatsError::MalformedRecord {
        entity: entity.identity.id.to_string(),
        field: field.to_string(),
        reason: "sum overflows".to_string(),
    };

    for record in &entity.records {
        if let Some(team) = &record.team {
            identity.observe_team(team);
        }
        if let Some(position) = &record.position {
            identity.observe_position(position);
        }

        if !active.contains(&record.strength_situation) {
            continue;
        }
        totals = totals.checked_add(&record.stats).map_err(overflow)?;
        if record.strength_situation == StrengthSituation::NoOwnGoalie {
            own_net_empty = own_net_empty.checked_add(&record.stats).map_err(overflow)?;
        }
    }

    Ok(AggregatedEntity::new(identity, totals, own_net_empty))
}

/// Aggregate every entity. Output order follows first appearance.
pub fn aggregate(
    entities: &[EntityRecords],
    filter: SituationFilter,
) -> Result<Vec<AggregatedEntity>, StatsError> {
    let grouped = group_by_entity(entities);
    let aggregated = grouped
        .iter()
        .map(|entity| aggregate_entity(entity, filter))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "Aggregated {} entities over situation filter {}",
        aggregated.len(),
        filter
    );
    Ok(aggregated)
}
