//! Axum route handler for the AI insights API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::insights::gateway::{AnalysisResult, FallbackReason};
use crate::insights::prompts::{AnalysisType, InsightJob, JobPosting};
use crate::jobs::validation::non_blank;
use crate::state::AppState;

const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Copy the prompt into any chat assistant you already use",
    "Paste it as a single message so the job list stays intact",
    "Try again later once the AI provider is reachable",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    /// Job snapshots supplied by the client.
    #[serde(default)]
    pub jobs: Vec<InsightJob>,
    /// Alternatively, ids of stored jobs. Ignored when `jobs` is non-empty.
    #[serde(default)]
    pub job_ids: Vec<String>,
    pub analysis_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzePostingRequest {
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub job_description: Option<String>,
    pub analysis_type: Option<String>,
}

impl AnalyzePostingRequest {
    fn into_posting(self) -> Result<JobPosting, AppError> {
        let title = non_blank(self.job_title);
        let company = non_blank(self.company);
        let (Some(title), Some(company)) = (title, company) else {
            return Err(AppError::Validation(
                "Missing required fields: jobTitle, company".to_string(),
            ));
        };
        Ok(JobPosting {
            title,
            company,
            description: non_blank(self.job_description),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResponse {
    pub success: bool,
    pub mode: &'static str,
    pub analysis_type: AnalysisType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
    pub copyable_prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl InsightResponse {
    fn from_result(result: AnalysisResult, analysis_type: AnalysisType) -> Self {
        let mode = result.mode();
        match result {
            AnalysisResult::Ai {
                text,
                tokens_used,
                prompt_text,
            } => Self {
                success: true,
                mode,
                analysis_type,
                analysis: Some(text),
                tokens_used,
                copyable_prompt: prompt_text,
                message: None,
                error: None,
                suggestions: vec![],
            },
            AnalysisResult::Prompt {
                prompt_text,
                reason,
            } => {
                let (message, error, suggestions) = match &reason {
                    FallbackReason::NoCredential => (Some(reason.message()), None, vec![]),
                    FallbackReason::ProviderFailure(_) => (
                        None,
                        Some(reason.message()),
                        FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
                    ),
                };
                Self {
                    success: true,
                    mode,
                    analysis_type,
                    analysis: None,
                    tokens_used: None,
                    copyable_prompt: prompt_text,
                    message,
                    error,
                    suggestions,
                }
            }
        }
    }
}

/// POST /ai-insights
///
/// Rejects an empty selection; otherwise always answers `success: true`,
/// either with generated analysis or with the prompt to paste elsewhere.
pub async fn handle_ai_insights(
    State(state): State<AppState>,
    payload: Result<Json<InsightRequest>, JsonRejection>,
) -> Result<Json<InsightResponse>, AppError> {
    let Json(request) = payload?;
    let analysis_type = AnalysisType::from_tag(request.analysis_type.as_deref());

    let jobs = if !request.jobs.is_empty() {
        request.jobs
    } else if !request.job_ids.is_empty() {
        resolve_job_ids(&state, &request.job_ids).await?
    } else {
        return Err(AppError::Validation("No jobs data provided".to_string()));
    };

    let result = state.gateway.analyze(&jobs, analysis_type).await;
    Ok(Json(InsightResponse::from_result(result, analysis_type)))
}

/// POST /ai/analyze
///
/// Analysis of one posting by title, company and optional description. Same
/// envelope and fallback behaviour as `/ai-insights`.
pub async fn handle_analyze_posting(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzePostingRequest>, JsonRejection>,
) -> Result<Json<InsightResponse>, AppError> {
    let Json(request) = payload?;
    let analysis_type = AnalysisType::from_tag(request.analysis_type.as_deref());
    let posting = request.into_posting()?;

    let result = state.gateway.analyze_posting(&posting, analysis_type).await;
    Ok(Json(InsightResponse::from_result(result, analysis_type)))
}

async fn resolve_job_ids(state: &AppState, ids: &[String]) -> Result<Vec<InsightJob>, AppError> {
    let mut jobs = Vec::with_capacity(ids.len());
    for id in ids {
        let job = state
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
        jobs.push(InsightJob::from(&job));
    }
    Ok(jobs)
}
