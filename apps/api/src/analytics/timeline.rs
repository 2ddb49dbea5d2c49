//! Timeline derivation.
//!
//! Only the application date is recorded, so follow-up events (interview,
//! offer, rejection) are estimated. Their offsets come from a SHA-256 of the
//! job id and event kind: the same job always yields the same dates. Every
//! estimated event is marked `synthetic`.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::jobs::models::{JobApplication, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Application,
    Interview,
    Offer,
    Rejection,
}

impl EventKind {
    fn as_str(&self) -> &'static str {
        match self {
            EventKind::Application => "application",
            EventKind::Interview => "interview",
            EventKind::Offer => "offer",
            EventKind::Rejection => "rejection",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    /// `<jobId>-<kind>`
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub date: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub company: String,
    pub job_id: String,
    pub status: JobStatus,
    pub synthetic: bool,
}

/// Inclusive day range for an estimated event, relative to its anchor.
struct OffsetWindow {
    min_days: u64,
    span: u64,
}

const INTERVIEW_AFTER_APPLYING: OffsetWindow = OffsetWindow {
    min_days: 3,
    span: 14,
};
const OFFER_AFTER_INTERVIEW: OffsetWindow = OffsetWindow {
    min_days: 1,
    span: 7,
};
const REJECTION_AFTER_APPLYING: OffsetWindow = OffsetWindow {
    min_days: 7,
    span: 21,
};

fn offset_days(job_id: &str, kind: EventKind, window: &OffsetWindow) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(job_id.as_bytes());
    hasher.update(b":");
    hasher.update(kind.as_str().as_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let roll = u64::from_be_bytes(head) % window.span;
    (window.min_days + roll) as i64
}

fn event(
    job: &JobApplication,
    kind: EventKind,
    date: DateTime<Utc>,
    title: String,
    description: String,
) -> TimelineEvent {
    TimelineEvent {
        id: format!("{}-{}", job.id, kind.as_str()),
        kind,
        date,
        title,
        description,
        company: job.company.clone(),
        job_id: job.id.clone(),
        status: job.status,
        synthetic: kind != EventKind::Application,
    }
}

fn events_for(job: &JobApplication) -> Vec<TimelineEvent> {
    let applied = job.date_applied;
    let mut events = vec![event(
        job,
        EventKind::Application,
        applied,
        format!("Applied to {}", job.title),
        format!("Submitted application for {} position", job.title),
    )];

    let interview_date = || {
        applied
            + Duration::days(offset_days(
                &job.id,
                EventKind::Interview,
                &INTERVIEW_AFTER_APPLYING,
            ))
    };

    match job.status {
        JobStatus::Applied => {}
        JobStatus::Interviewing => events.push(event(
            job,
            EventKind::Interview,
            interview_date(),
            "Interview scheduled".to_string(),
            format!("Interview scheduled for {} position", job.title),
        )),
        JobStatus::Offer => {
            let interviewed = interview_date();
            let offered = interviewed
                + Duration::days(offset_days(&job.id, EventKind::Offer, &OFFER_AFTER_INTERVIEW));
            events.push(event(
                job,
                EventKind::Interview,
                interviewed,
                "Interview completed".to_string(),
                format!("Interview completed for {} position", job.title),
            ));
            events.push(event(
                job,
                EventKind::Offer,
                offered,
                "Offer received".to_string(),
                format!("Job offer received for {} position", job.title),
            ));
        }
        JobStatus::Rejected => events.push(event(
            job,
            EventKind::Rejection,
            applied
                + Duration::days(offset_days(
                    &job.id,
                    EventKind::Rejection,
                    &REJECTION_AFTER_APPLYING,
                )),
            "Application declined".to_string(),
            format!("Received rejection for {} position", job.title),
        )),
    }

    events
}

/// All events for `jobs`, newest first. Ties are ordered by event id.
pub fn derive_events(jobs: &[JobApplication]) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = jobs.iter().flat_map(events_for).collect();
    events.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn job(id: &str, status: JobStatus) -> JobApplication {
        let applied = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        JobApplication {
            id: id.to_string(),
            title: "Platform Engineer".to_string(),
            company: "Acme".to_string(),
            application_link: "https://acme.example".to_string(),
            status,
            date_applied: applied,
            created_at: applied,
            updated_at: applied,
        }
    }

    fn days_after_applying(job: &JobApplication, event: &TimelineEvent) -> i64 {
        (event.date - job.date_applied).num_days()
    }

    #[test]
    fn test_applied_job_has_single_real_event() {
        let j = job("a1", JobStatus::Applied);
        let events = derive_events(&[j.clone()]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Application);
        assert_eq!(events[0].date, j.date_applied);
        assert_eq!(events[0].id, "a1-application");
        assert!(!events[0].synthetic);
    }

    #[test]
    fn test_interviewing_offset_window() {
        let j = job("i1", JobStatus::Interviewing);
        let events = derive_events(&[j.clone()]);
        assert_eq!(events.len(), 2);
        let interview = events.iter().find(|e| e.kind == EventKind::Interview).unwrap();
        assert!(interview.synthetic);
        assert_eq!(interview.title, "Interview scheduled");
        assert!((3..=16).contains(&days_after_applying(&j, interview)));
    }

    #[test]
    fn test_offer_follows_interview() {
        let j = job("o1", JobStatus::Offer);
        let events = derive_events(&[j.clone()]);
        assert_eq!(events.len(), 3);
        let interview = events.iter().find(|e| e.kind == EventKind::Interview).unwrap();
        let offer = events.iter().find(|e| e.kind == EventKind::Offer).unwrap();
        let gap = (offer.date - interview.date).num_days();
        assert!((1..=7).contains(&gap));
        assert_eq!(interview.title, "Interview completed");
    }

    #[test]
    fn test_rejection_offset_window() {
        let j = job("r1", JobStatus::Rejected);
        let events = derive_events(&[j.clone()]);
        let rejection = events.iter().find(|e| e.kind == EventKind::Rejection).unwrap();
        assert!((7..=27).contains(&days_after_applying(&j, rejection)));
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let jobs: Vec<_> = (0..20)
            .map(|i| {
                let status = JobStatus::ALL[i % 4];
                job(&format!("job-{i}"), status)
            })
            .collect();
        assert_eq!(derive_events(&jobs), derive_events(&jobs));
    }

    #[test]
    fn test_events_sorted_newest_first() {
        let jobs = vec![job("x", JobStatus::Rejected), job("y", JobStatus::Offer)];
        let events = derive_events(&jobs);
        assert!(events.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[test]
    fn test_event_serializes_type_field() {
        let events = derive_events(&[job("s1", JobStatus::Applied)]);
        let value = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(value["type"], "application");
        assert_eq!(value["jobId"], "s1");
    }
}
