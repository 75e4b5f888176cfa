use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate::{SortColumn, SortDirection, SortState};
use crate::models::{EntityKind, SituationFilter};
use crate::table::{load_table, RankedTable, TableRequest};

#[derive(Debug, Default, Deserialize)]
pub struct TableParams {
    pub situation: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
}

impl TableParams {
    /// Resolve query parameters, falling back to the kind's defaults.
    pub fn to_request(&self, kind: EntityKind) -> Result<TableRequest, ApiError> {
        let mut request = TableRequest::new(kind);

        if let Some(situation) = self.situation.as_deref() {
            request.situation = situation
                .parse::<SituationFilter>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        }

        if let Some(sort) = self.sort.as_deref() {
            let column = sort.parse::<SortColumn>().map_err(ApiError::BadRequest)?;
            request.sort = SortState::new(column);
        }

        if let Some(order) = self.order.as_deref() {
            request.sort.direction = order.parse::<SortDirection>().map_err(ApiError::BadRequest)?;
        }

        request.limit = self.limit;
        Ok(request)
    }
}

pub async fn players(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<RankedTable>, ApiError> {
    let request = params.to_request(EntityKind::Player)?;
    let table = load_table(state.source.as_ref(), &state.pipeline, &request).await?;
    Ok(Json(table))
}

pub async fn teams(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<RankedTable>, ApiError> {
    let request = params.to_request(EntityKind::Team)?;
    let table = load_table(state.source.as_ref(), &state.pipeline, &request).await?;
    Ok(Json(table))
}
