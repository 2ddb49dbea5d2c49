use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analytics::aggregation::{compute_analytics, AnalyticsSummary, DateRange};
use crate::analytics::timeline::{derive_events, TimelineEvent};
use crate::errors::AppError;
use crate::jobs::query::status_filter;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimelineQuery {
    pub range: Option<String>,
    /// Job status, or `all`.
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub success: bool,
    pub analytics: AnalyticsSummary,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub success: bool,
    pub events: Vec<TimelineEvent>,
}

/// GET /analytics
pub async fn handle_analytics(
    State(state): State<AppState>,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<AnalyticsResponse>, AppError> {
    let Query(query) = query?;
    let range = DateRange::from_tag(query.range.as_deref());
    let jobs = state.store.list().await?;

    Ok(Json(AnalyticsResponse {
        success: true,
        analytics: compute_analytics(&jobs, range, Utc::now()),
    }))
}

/// GET /timeline
///
/// Range and status filter the jobs before events are derived, so a job
/// inside the range contributes all of its events.
pub async fn handle_timeline(
    State(state): State<AppState>,
    query: Result<Query<TimelineQuery>, QueryRejection>,
) -> Result<Json<TimelineResponse>, AppError> {
    let Query(query) = query?;
    let range = DateRange::from_tag(query.range.as_deref());
    let status = status_filter(query.status.as_deref())?;
    let now = Utc::now();

    let jobs: Vec<_> = state
        .store
        .list()
        .await?
        .into_iter()
        .filter(|job| range.contains(job, now))
        .filter(|job| status.map_or(true, |s| job.status == s))
        .collect();

    Ok(Json(TimelineResponse {
        success: true,
        events: derive_events(&jobs),
    }))
}
