use std::sync::Arc;

use crate::calculate::StatsPipeline;
use crate::fetch::StatsSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn StatsSource>,
    pub pipeline: Arc<StatsPipeline>,
}

impl AppState {
    pub fn new(source: Arc<dyn StatsSource>, pipeline: StatsPipeline) -> Self {
        Self {
            source,
            pipeline: Arc::new(pipeline),
        }
    }
}
