//! Statistics calculation engine.
//!
//! Turns situational records into ranked, display-ready entities:
//! - Score-adjustment of shot attempts
//! - Normalization of raw upstream rows
//! - Aggregation over a strength-situation filter
//! - Derived rate stats (Sh%, Sv%, CF%, score-adjusted CF%)
//! - Tie-aware ranking
//!
//! Each stage is a pure function over its input; callers re-run the
//! pipeline whenever the filter or sort changes.

pub mod adjust;
pub mod aggregate;
pub mod derive;
pub mod normalize;
pub mod rank;

use thiserror::Error;
use tracing::debug;

use crate::config::{AppConfig, ConfigError};
use crate::fetch::FetchError;
use crate::models::{
    AggregatedEntity, EntityRecords, PlayersPayload, SituationFilter, TeamsPayload,
};

pub use adjust::ScoreAdjustment;
pub use rank::{SortColumn, SortDirection, SortState};

/// Errors raised by a pipeline invocation.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Malformed record for {entity}: {field} {reason}")]
    MalformedRecord {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("Upstream fetch failed: {0}")]
    UpstreamFetch(#[from] FetchError),
}

/// The normalize → aggregate → derive → rank pipeline.
///
/// Holds only the validated weight table, so one instance can be shared
/// across requests.
#[derive(Debug, Clone, Default)]
pub struct StatsPipeline {
    adjustment: ScoreAdjustment,
}

impl StatsPipeline {
    pub fn new(adjustment: ScoreAdjustment) -> Self {
        Self { adjustment }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(ScoreAdjustment::from_config(&config.score_adjustment)?))
    }

    pub fn adjustment(&self) -> &ScoreAdjustment {
        &self.adjustment
    }

    pub fn normalize_players(&self, payload: &PlayersPayload) -> Result<Vec<EntityRecords>, StatsError> {
        normalize::normalize_players(payload, &self.adjustment)
    }

    pub fn normalize_teams(&self, payload: &TeamsPayload) -> Result<Vec<EntityRecords>, StatsError> {
        normalize::normalize_teams(payload, &self.adjustment)
    }

    /// Aggregate and derive metrics. Ranks are left unset.
    pub fn aggregate(
        &self,
        entities: &[EntityRecords],
        filter: SituationFilter,
    ) -> Result<Vec<AggregatedEntity>, StatsError> {
        let mut aggregated = aggregate::aggregate(entities, filter)?;
        derive::apply_metrics(&mut aggregated, filter)?;
        Ok(aggregated)
    }

    pub fn rank(&self, entities: Vec<AggregatedEntity>, sort: &SortState) -> Vec<AggregatedEntity> {
        debug!("Ranking {} entities by {} {}", entities.len(), sort.column, sort.direction);
        rank::rank_entities(entities, sort)
    }

    /// Full run over already-normalized entities.
    pub fn run(
        &self,
        entities: &[EntityRecords],
        filter: SituationFilter,
        sort: &SortState,
    ) -> Result<Vec<AggregatedEntity>, StatsError> {
        Ok(self.rank(self.aggregate(entities, filter)?, sort))
    }
}
