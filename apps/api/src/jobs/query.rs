//! List-level operations over the job collection: filter, sort, counts, CSV.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::models::{JobApplication, JobStatus};
use crate::jobs::validation::parse_status;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "dateApplied")]
    DateApplied,
    #[serde(rename = "company")]
    Company,
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "status")]
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Query string for `GET /jobs` and `GET /jobs/export.csv`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    /// A status name, or `all` / absent for no filter.
    pub status: Option<String>,
    /// Case-insensitive substring match on title or company.
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobStats {
    pub total: usize,
    pub applied: usize,
    pub interviewing: usize,
    pub offers: usize,
    pub rejected: usize,
}

/// Parses the `status` filter. `None` means "every status".
pub fn status_filter(raw: Option<&str>) -> Result<Option<JobStatus>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => parse_status(s).map(Some),
    }
}

pub fn apply_query(
    mut jobs: Vec<JobApplication>,
    query: &ListQuery,
) -> Result<Vec<JobApplication>, AppError> {
    if let Some(status) = status_filter(query.status.as_deref())? {
        jobs.retain(|j| j.status == status);
    }

    if let Some(term) = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        let term = term.to_lowercase();
        jobs.retain(|j| {
            j.title.to_lowercase().contains(&term) || j.company.to_lowercase().contains(&term)
        });
    }

    jobs.sort_by(|a, b| {
        let ord = compare(a, b, query.sort_by);
        match query.order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    Ok(jobs)
}

fn compare(a: &JobApplication, b: &JobApplication, field: SortField) -> Ordering {
    match field {
        SortField::DateApplied => a.date_applied.cmp(&b.date_applied),
        SortField::Company => a.company.to_lowercase().cmp(&b.company.to_lowercase()),
        SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

pub fn compute_stats(jobs: &[JobApplication]) -> JobStats {
    let count = |status: JobStatus| jobs.iter().filter(|j| j.status == status).count();
    JobStats {
        total: jobs.len(),
        applied: count(JobStatus::Applied),
        interviewing: count(JobStatus::Interviewing),
        offers: count(JobStatus::Offer),
        rejected: count(JobStatus::Rejected),
    }
}

const CSV_HEADERS: [&str; 5] = [
    "Job Title",
    "Company",
    "Status",
    "Date Applied",
    "Application Link",
];

/// Every field is quoted; embedded quotes are doubled.
pub fn to_csv(jobs: &[JobApplication]) -> String {
    let header = csv_row(CSV_HEADERS.iter().copied());
    let rows = jobs.iter().map(|job| {
        let date = job.date_applied.format("%Y-%m-%d").to_string();
        csv_row(
            [
                job.title.as_str(),
                job.company.as_str(),
                job.status.as_str(),
                date.as_str(),
                job.application_link.as_str(),
            ]
            .into_iter(),
        )
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_row<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    fields
        .map(|f| format!("\"{}\"", f.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}
