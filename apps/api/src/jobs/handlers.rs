use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::jobs::models::JobApplication;
use crate::jobs::query::{apply_query, compute_stats, to_csv, JobStats, ListQuery};
use crate::jobs::validation::{validate_new_job, validate_patch, CreateJobRequest, UpdateJobRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub success: bool,
    pub jobs: Vec<JobApplication>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: JobApplication,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: JobStats,
}

fn job_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Job {id} not found"))
}

/// GET /jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<JobListResponse>, AppError> {
    let Query(query) = query?;
    let jobs = apply_query(state.store.list().await?, &query)?;
    Ok(Json(JobListResponse {
        success: true,
        jobs,
    }))
}

/// POST /jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let new_job = validate_new_job(request)?;
    let job = state.store.create(new_job).await?;
    info!("Created job {} ({} at {})", job.id, job.title, job.company);
    Ok((
        StatusCode::CREATED,
        Json(JobResponse { success: true, job }),
    ))
}

/// GET /jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    let job = state
        .store
        .get(&id)
        .await?
        .ok_or_else(|| job_not_found(&id))?;
    Ok(Json(JobResponse { success: true, job }))
}

/// PUT /jobs/:id
///
/// Existence is checked before the body is validated, so an unknown id is a
/// 404 even when the body is also invalid.
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateJobRequest>, JsonRejection>,
) -> Result<Json<JobResponse>, AppError> {
    if state.store.get(&id).await?.is_none() {
        return Err(job_not_found(&id));
    }

    let Json(request) = payload?;
    let patch = validate_patch(request)?;
    let job = state
        .store
        .update(&id, patch)
        .await?
        .ok_or_else(|| job_not_found(&id))?;
    info!("Updated job {} (status {})", job.id, job.status);
    Ok(Json(JobResponse { success: true, job }))
}

/// DELETE /jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    if !state.store.delete(&id).await? {
        return Err(job_not_found(&id));
    }
    info!("Deleted job {id}");
    Ok(Json(DeleteResponse {
        success: true,
        message: "Job deleted successfully".to_string(),
    }))
}

/// GET /jobs/stats
pub async fn handle_job_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let jobs = state.store.list().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats: compute_stats(&jobs),
    }))
}

/// GET /jobs/export.csv
///
/// Honours the same filter and sort parameters as `GET /jobs`.
pub async fn handle_export_csv(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    let jobs = apply_query(state.store.list().await?, &query)?;
    let filename = format!(
        "job-applications-{}.csv",
        chrono::Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        to_csv(&jobs),
    ))
}
