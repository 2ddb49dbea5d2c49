//! Insight gateway — turns a job selection or a single posting into either
//! generated advice or a copyable prompt. It never returns an error: every path
//! ends in a result the user can act on.
//!
//! ```text
//! no provider ────────────────────────────► Prompt { NoCredential }
//! provider ── complete() ── Ok ───────────► Ai { text, tokens_used }
//!                        └─ Err ──────────► Prompt { ProviderFailure(reason) }
//! ```
//!
//! Exactly one completion attempt per request.

use std::sync::Arc;

use tracing::{info, warn};

use crate::insights::prompts::{
    build_job_prompt, build_prompt, AnalysisType, InsightJob, JobPosting, CAREER_ADVISOR_SYSTEM,
    INSIGHT_MAX_TOKENS, POSTING_ADVISOR_SYSTEM, POSTING_MAX_TOKENS,
};
use crate::llm_client::CompletionProvider;

#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NoCredential,
    ProviderFailure(String),
}

impl FallbackReason {
    pub fn message(&self) -> String {
        match self {
            FallbackReason::NoCredential => {
                "No API key configured. Use the prompt below with any AI service.".to_string()
            }
            FallbackReason::ProviderFailure(reason) => format!(
                "AI provider unavailable ({reason}). Use the prompt below with any AI service."
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Ai {
        text: String,
        tokens_used: Option<u32>,
        prompt_text: String,
    },
    Prompt {
        prompt_text: String,
        reason: FallbackReason,
    },
}

impl AnalysisResult {
    pub fn mode(&self) -> &'static str {
        match self {
            AnalysisResult::Ai { .. } => "ai",
            AnalysisResult::Prompt { .. } => "prompt",
        }
    }

    #[cfg(test)]
    pub fn prompt_text(&self) -> &str {
        match self {
            AnalysisResult::Ai { prompt_text, .. } | AnalysisResult::Prompt { prompt_text, .. } => {
                prompt_text
            }
        }
    }
}

#[derive(Clone)]
pub struct InsightGateway {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl InsightGateway {
    /// `None` puts the gateway permanently in prompt mode.
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    pub fn is_live(&self) -> bool {
        self.provider.is_some()
    }

    /// Callers must pass at least one job.
    pub async fn analyze(&self, jobs: &[InsightJob], analysis_type: AnalysisType) -> AnalysisResult {
        let prompt_text = build_prompt(jobs, analysis_type);
        let subject = format!("{} jobs", jobs.len());
        self.run(
            CAREER_ADVISOR_SYSTEM,
            prompt_text,
            INSIGHT_MAX_TOKENS,
            analysis_type,
            &subject,
        )
        .await
    }

    /// Single-posting analysis, same fallback rules as `analyze`.
    pub async fn analyze_posting(
        &self,
        posting: &JobPosting,
        analysis_type: AnalysisType,
    ) -> AnalysisResult {
        let prompt_text = build_job_prompt(posting, analysis_type);
        let subject = format!("posting {} at {}", posting.title, posting.company);
        self.run(
            POSTING_ADVISOR_SYSTEM,
            prompt_text,
            POSTING_MAX_TOKENS,
            analysis_type,
            &subject,
        )
        .await
    }

    async fn run(
        &self,
        system: &str,
        prompt_text: String,
        max_tokens: u32,
        analysis_type: AnalysisType,
        subject: &str,
    ) -> AnalysisResult {
        let Some(provider) = &self.provider else {
            info!(
                "No completion provider configured; returning {} prompt for {subject}",
                analysis_type.as_str()
            );
            return AnalysisResult::Prompt {
                prompt_text,
                reason: FallbackReason::NoCredential,
            };
        };

        match provider.complete(system, &prompt_text, max_tokens).await {
            Ok(completion) => {
                info!(
                    "Generated {} insight for {subject} with {} (tokens_used={:?})",
                    analysis_type.as_str(),
                    provider.model(),
                    completion.tokens_used
                );
                AnalysisResult::Ai {
                    text: completion.text,
                    tokens_used: completion.tokens_used,
                    prompt_text,
                }
            }
            Err(e) => {
                warn!("Completion failed, falling back to prompt mode: {e}");
                AnalysisResult::Prompt {
                    prompt_text,
                    reason: FallbackReason::ProviderFailure(e.short_reason()),
                }
            }
        }
    }
}
