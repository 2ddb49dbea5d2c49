//! Request validation for the jobs API.
//!
//! Incoming bodies are deserialized into loose request structs (every field
//! optional) and converted here into `NewJob` / `JobPatch`. Nothing else
//! constructs those types, so the store only ever sees trimmed, non-empty
//! fields and a known status.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::AppError;
use crate::jobs::models::{JobPatch, JobStatus, NewJob};

pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: title, company, applicationLink, status";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub application_link: Option<String>,
    pub status: Option<String>,
    pub date_applied: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub application_link: Option<String>,
    pub status: Option<String>,
    pub date_applied: Option<String>,
}

pub fn validate_new_job(req: CreateJobRequest) -> Result<NewJob, AppError> {
    let title = non_blank(req.title);
    let company = non_blank(req.company);
    let application_link = non_blank(req.application_link);
    let status = non_blank(req.status);

    let (Some(title), Some(company), Some(application_link), Some(status)) =
        (title, company, application_link, status)
    else {
        return Err(AppError::Validation(MISSING_FIELDS_MESSAGE.to_string()));
    };

    Ok(NewJob {
        title,
        company,
        application_link,
        status: parse_status(&status)?,
        date_applied: parse_optional_date(req.date_applied)?,
    })
}

/// Blank strings are treated as "not provided" so an update can never empty a
/// required field.
pub fn validate_patch(req: UpdateJobRequest) -> Result<JobPatch, AppError> {
    let status = match non_blank(req.status) {
        Some(raw) => Some(parse_status(&raw)?),
        None => None,
    };

    Ok(JobPatch {
        title: non_blank(req.title),
        company: non_blank(req.company),
        application_link: non_blank(req.application_link),
        status,
        date_applied: parse_optional_date(req.date_applied)?,
    })
}

pub fn parse_status(raw: &str) -> Result<JobStatus, AppError> {
    raw.trim().parse::<JobStatus>().map_err(|_| {
        AppError::Validation(format!(
            "Invalid job status: Must be one of: {}",
            JobStatus::allowed_values()
        ))
    })
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_optional_date(raw: Option<String>) -> Result<Option<DateTime<Utc>>, AppError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(raw) => parse_date(&raw).map(Some).ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid dateApplied '{raw}': expected RFC 3339 or YYYY-MM-DD"
            ))
        }),
    }
}

/// Trims; blank and missing are the same.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn full_request() -> CreateJobRequest {
        CreateJobRequest {
            title: Some("  Backend Engineer ".to_string()),
            company: Some("Acme".to_string()),
            application_link: Some("https://acme.example/jobs/1".to_string()),
            status: Some("Applied".to_string()),
            date_applied: None,
        }
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_create_is_trimmed() {
        let job = validate_new_job(full_request()).unwrap();
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.status, JobStatus::Applied);
        assert_eq!(job.date_applied, None);
    }

    #[test]
    fn test_missing_field_rejected() {
        let req = CreateJobRequest {
            company: None,
            ..full_request()
        };
        let msg = validation_message(validate_new_job(req).unwrap_err());
        assert_eq!(msg, MISSING_FIELDS_MESSAGE);
    }

    #[test]
    fn test_whitespace_only_field_counts_as_missing() {
        let req = CreateJobRequest {
            application_link: Some("   ".to_string()),
            ..full_request()
        };
        assert!(validate_new_job(req).is_err());
    }

    #[test]
    fn test_invalid_status_rejected() {
        let req = CreateJobRequest {
            status: Some("Ghosted".to_string()),
            ..full_request()
        };
        let msg = validation_message(validate_new_job(req).unwrap_err());
        assert!(msg.contains("Invalid job status"));
        assert!(msg.contains("Applied, Interviewing, Offer, Rejected"));
    }

    #[test]
    fn test_create_with_plain_date() {
        let req = CreateJobRequest {
            date_applied: Some("2025-01-20".to_string()),
            ..full_request()
        };
        let job = validate_new_job(req).unwrap();
        assert_eq!(
            job.date_applied,
            Some(Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_create_with_bad_date_rejected() {
        let req = CreateJobRequest {
            date_applied: Some("last tuesday".to_string()),
            ..full_request()
        };
        assert!(validate_new_job(req).is_err());
    }

    #[test]
    fn test_patch_ignores_blank_fields() {
        let patch = validate_patch(UpdateJobRequest {
            title: Some("".to_string()),
            company: Some(" Globex ".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.title, None);
        assert_eq!(patch.company.as_deref(), Some("Globex"));
    }

    #[test]
    fn test_patch_invalid_status_rejected() {
        let req = UpdateJobRequest {
            status: Some("Hired".to_string()),
            ..Default::default()
        };
        assert!(validate_patch(req).is_err());
    }

    #[test]
    fn test_parse_date_rfc3339_with_offset() {
        let parsed = parse_date("2025-01-20T10:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2025, 1, 20, 8, 0, 0).unwrap());
    }
}
