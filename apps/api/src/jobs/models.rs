use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobStatus {
    Applied,
    Interviewing,
    Offer,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::Interviewing,
        JobStatus::Offer,
        JobStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::Interviewing => "Interviewing",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
        }
    }

    /// Interviewing and Offer both count as a response from the company.
    pub fn is_response(&self) -> bool {
        matches!(self, JobStatus::Interviewing | JobStatus::Offer)
    }

    /// "Applied, Interviewing, Offer, Rejected"
    pub fn allowed_values() -> String {
        JobStatus::ALL
            .iter()
            .map(JobStatus::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    /// Exact match only; the stored and wire form is the capitalized name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// One tracked job application. Field names match the persisted document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: String,
    pub title: String,
    pub company: String,
    pub application_link: String,
    pub status: JobStatus,
    pub date_applied: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated create input. Only `validation::validate_new_job` builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub application_link: String,
    pub status: JobStatus,
    pub date_applied: Option<DateTime<Utc>>,
}

/// Validated partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub title: Option<String>,
    pub company: Option<String>,
    pub application_link: Option<String>,
    pub status: Option<JobStatus>,
    pub date_applied: Option<DateTime<Utc>>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.application_link.is_none()
            && self.status.is_none()
            && self.date_applied.is_none()
    }
}

impl JobApplication {
    pub fn from_new(id: String, new_job: NewJob, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new_job.title,
            company: new_job.company,
            application_link: new_job.application_link,
            status: new_job.status,
            date_applied: new_job.date_applied.unwrap_or(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the patch in place. Returns whether anything was applied.
    pub fn apply(&mut self, patch: JobPatch, now: DateTime<Utc>) -> bool {
        if patch.is_empty() {
            return false;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(company) = patch.company {
            self.company = company;
        }
        if let Some(link) = patch.application_link {
            self.application_link = link;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(date_applied) = patch.date_applied {
            self.date_applied = date_applied;
        }
        self.updated_at = now;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_job() -> NewJob {
        NewJob {
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            application_link: "https://acme.example/jobs/1".to_string(),
            status: JobStatus::Applied,
            date_applied: None,
        }
    }

    #[test]
    fn test_status_from_str_exact() {
        assert_eq!("Offer".parse::<JobStatus>(), Ok(JobStatus::Offer));
        assert!("offer".parse::<JobStatus>().is_err());
        assert!("Pending".parse::<JobStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_capitalized() {
        let json = serde_json::to_string(&JobStatus::Interviewing).unwrap();
        assert_eq!(json, "\"Interviewing\"");
    }

    #[test]
    fn test_allowed_values_lists_enum() {
        assert_eq!(
            JobStatus::allowed_values(),
            "Applied, Interviewing, Offer, Rejected"
        );
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let now = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        let job = JobApplication::from_new("abc".to_string(), new_job(), now);
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["applicationLink"], "https://acme.example/jobs/1");
        assert_eq!(value["status"], "Applied");
        assert!(value.get("dateApplied").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn test_from_new_defaults_date_applied_to_now() {
        let now = Utc.with_ymd_and_hms(2025, 2, 1, 12, 0, 0).unwrap();
        let job = JobApplication::from_new("id".to_string(), new_job(), now);
        assert_eq!(job.date_applied, now);
        assert_eq!(job.created_at, now);
        assert_eq!(job.updated_at, now);
    }

    #[test]
    fn test_apply_refreshes_updated_at() {
        let created = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap();
        let mut job = JobApplication::from_new("id".to_string(), new_job(), created);

        let changed = job.apply(
            JobPatch {
                status: Some(JobStatus::Interviewing),
                ..Default::default()
            },
            later,
        );

        assert!(changed);
        assert_eq!(job.status, JobStatus::Interviewing);
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.updated_at, later);
        assert_eq!(job.created_at, created);
    }

    #[test]
    fn test_apply_empty_patch_is_noop() {
        let created = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap();
        let mut job = JobApplication::from_new("id".to_string(), new_job(), created);

        assert!(!job.apply(JobPatch::default(), later));
        assert_eq!(job.updated_at, created);
    }
}
