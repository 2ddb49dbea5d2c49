pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analytics::handlers as analytics;
use crate::insights::handlers as insights;
use crate::jobs::handlers as jobs;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route(
            "/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/jobs/stats", get(jobs::handle_job_stats))
        .route("/jobs/export.csv", get(jobs::handle_export_csv))
        .route(
            "/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Insights API
        .route("/ai-insights", post(insights::handle_ai_insights))
        .route("/ai/analyze", post(insights::handle_analyze_posting))
        // Analytics API
        .route("/analytics", get(analytics::handle_analytics))
        .route("/timeline", get(analytics::handle_timeline))
        .with_state(state)
}
