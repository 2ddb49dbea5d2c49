//! Prompt construction for career insights.
//!
//! Two prompt families:
//! - `build_prompt` covers a selection of tracked applications.
//! - `build_job_prompt` covers a single posting (title, company, description).
//!
//! Both are pure: identical input produces byte-identical output.
//! `build_prompt` does not special-case an empty job list; callers reject that first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::jobs::models::JobApplication;
use crate::jobs::validation::parse_date;

/// System message sent alongside every application-insight prompt.
pub const CAREER_ADVISOR_SYSTEM: &str = "You are an expert career advisor specializing in \
    job search optimization. Provide actionable, encouraging insights based on application data.";

/// System message for single-posting analysis.
pub const POSTING_ADVISOR_SYSTEM: &str = "You are a professional career advisor and job \
    application expert. Provide helpful, specific, and actionable advice.";

pub const INSIGHT_MAX_TOKENS: u32 = 1200;
pub const POSTING_MAX_TOKENS: u32 = 800;

const NOT_SPECIFIED: &str = "Not specified";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisType {
    #[default]
    Comprehensive,
    JobAnalysis,
    ApplicationStatus,
    InterviewPreparation,
}

impl AnalysisType {
    /// Unknown or missing tags select `Comprehensive`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("job-analysis") => AnalysisType::JobAnalysis,
            Some("application-status") => AnalysisType::ApplicationStatus,
            Some("interview-preparation") => AnalysisType::InterviewPreparation,
            _ => AnalysisType::Comprehensive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Comprehensive => "comprehensive",
            AnalysisType::JobAnalysis => "job-analysis",
            AnalysisType::ApplicationStatus => "application-status",
            AnalysisType::InterviewPreparation => "interview-preparation",
        }
    }

    fn focus_section(&self) -> &'static str {
        match self {
            AnalysisType::JobAnalysis => JOB_ANALYSIS_FOCUS,
            AnalysisType::ApplicationStatus => APPLICATION_STATUS_FOCUS,
            AnalysisType::InterviewPreparation => INTERVIEW_PREPARATION_FOCUS,
            AnalysisType::Comprehensive => COMPREHENSIVE_FOCUS,
        }
    }
}

const JOB_ANALYSIS_FOCUS: &str = "\
**Focus specifically on JOB ANALYSIS for this role:**
- Analyze the job title and company fit
- Assess market demand for this role
- Evaluate career growth potential
- Compare salary expectations vs market rate
- Identify key skills/requirements for success";

const APPLICATION_STATUS_FOCUS: &str = "\
**Focus specifically on APPLICATION STATUS & NEXT STEPS:**
- Analyze current application status and timeline
- Recommend specific follow-up actions
- Suggest optimal timing for follow-ups
- Provide interview preparation if applicable
- Identify potential concerns or red flags";

const INTERVIEW_PREPARATION_FOCUS: &str = "\
**Focus specifically on INTERVIEW PREPARATION:**
- Research the company culture and values
- Predict likely interview questions for this role
- Suggest specific examples/stories to prepare
- Recommend questions to ask the interviewer
- Provide salary negotiation strategies";

const COMPREHENSIVE_FOCUS: &str = "\
**Provide COMPREHENSIVE ANALYSIS covering:**
- Overall application strategy assessment
- Success rate and conversion analysis
- Pattern recognition and optimization opportunities
- Strategic recommendations for improvement";

const REPORT_SECTIONS: &str = "\
**📊 PERFORMANCE ANALYSIS**
- Current status assessment and timeline evaluation
- Market positioning and competitive analysis
- Success probability and optimization opportunities

**💡 STRATEGIC RECOMMENDATIONS**
- Specific, actionable next steps
- Timeline for implementation
- Key success metrics to track

**🚀 IMMEDIATE ACTION ITEMS**
- 3-5 concrete tasks to complete this week
- Follow-up strategy and timing
- Application optimization suggestions";

/// A job as submitted for analysis. Only the fields that reach the prompt.
///
/// `status` is rendered as given: snapshots come from clients and are not
/// held to the store's status enum.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightJob {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date_applied: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Client snapshots may carry full timestamps or bare dates; anything
/// unparseable is shown as "Not specified" rather than rejecting the request.
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_date))
}

impl From<&JobApplication> for InsightJob {
    fn from(job: &JobApplication) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company.clone(),
            status: job.status.as_str().to_string(),
            date_applied: Some(job.date_applied),
            location: None,
        }
    }
}

/// Reduced per-job view embedded in the prompt, in this key order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptJobView<'a> {
    title: &'a str,
    company: &'a str,
    status: &'a str,
    date_applied: String,
    location: &'a str,
}

impl<'a> From<&'a InsightJob> for PromptJobView<'a> {
    fn from(job: &'a InsightJob) -> Self {
        Self {
            title: &job.title,
            company: &job.company,
            status: non_blank_or(&job.status, NOT_SPECIFIED),
            date_applied: job
                .date_applied
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            location: non_blank_or(job.location.as_deref().unwrap_or_default(), NOT_SPECIFIED),
        }
    }
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    match value.trim() {
        "" => fallback,
        trimmed => trimmed,
    }
}

pub fn build_prompt(jobs: &[InsightJob], analysis_type: AnalysisType) -> String {
    let views: Vec<PromptJobView<'_>> = jobs.iter().map(PromptJobView::from).collect();
    let job_json = serde_json::to_string_pretty(&views).unwrap_or_default();

    let (intro, closing) = if jobs.len() == 1 {
        (
            "Analyze this specific job application:".to_string(),
            "Focus on this single application.",
        )
    } else {
        (
            format!("Analyze these {} job applications:", jobs.len()),
            "Focus on patterns across applications.",
        )
    };

    format!(
        "Act as an expert career advisor and data analyst specializing in job search optimization.

{intro}

{job_json}

{focus}

{sections}

Keep the tone professional but encouraging. Use emojis for visual appeal and structure. \
Be specific and actionable with all recommendations. {closing}",
        focus = analysis_type.focus_section(),
        sections = REPORT_SECTIONS,
    )
}

/// A single job posting to analyze, independent of the tracked records.
#[derive(Debug, Clone, PartialEq)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub description: Option<String>,
}

/// Prompt for one posting. `Comprehensive` gets general advice for the role.
pub fn build_job_prompt(posting: &JobPosting, analysis_type: AnalysisType) -> String {
    let title = posting.title.as_str();
    let company = posting.company.as_str();

    match analysis_type {
        AnalysisType::JobAnalysis => {
            let description = non_blank_or(
                posting.description.as_deref().unwrap_or_default(),
                "Not provided",
            );
            format!(
                "Analyze this job posting and provide insights:

Job Title: {title}
Company: {company}
Job Description: {description}

Please provide:
1. Key requirements and skills needed
2. Company culture insights
3. Salary range estimate
4. Application tips
5. Interview preparation advice

Keep the response concise and actionable."
            )
        }
        AnalysisType::ApplicationStatus => format!(
            "Based on this job application, suggest next steps:

Job Title: {title}
Company: {company}

Provide specific advice on:
1. Follow-up actions
2. Networking opportunities
3. Interview preparation focus areas
4. Alternative similar roles to consider
5. Additional skills to highlight

Be practical and specific."
        ),
        AnalysisType::InterviewPreparation => format!(
            "Help prepare for an interview at {company} for the position of {title}:

Provide:
1. 5 likely technical questions
2. 5 behavioral questions specific to this role
3. Questions to ask the interviewer
4. Company-specific talking points
5. Key achievements to highlight

Make it role-specific and actionable."
        ),
        AnalysisType::Comprehensive => format!(
            "Provide general advice for someone applying to {title} positions at companies like {company}."
        ),
    }
}
