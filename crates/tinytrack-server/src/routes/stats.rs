use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use tinytrack_core::analytics::DEFAULT_WINDOW_HOURS;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub hours: Option<i64>,
}

/// `GET /stats?hours=24` — windowed summary over the event store.
///
/// `hours` defaults to 24 and is clamped to [1, 720] by the aggregation
/// layer. Returns the structured Summary as JSON; rendering is the
/// presentation layer's concern. A store failure surfaces as an explicit
/// error response, never a silently empty report.
#[tracing::instrument(skip(state))]
pub async fn stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let hours = query.hours.unwrap_or(DEFAULT_WINDOW_HOURS);
    let summary = state.summary(hours).await?;
    Ok(Json(summary))
}
