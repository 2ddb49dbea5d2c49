//! Analytics aggregation — a pure reduction over the job collection.
//!
//! `now` is always injected so every window is reproducible in tests.
//! Percentages are integer-rounded and any division by zero yields 0.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::jobs::models::{JobApplication, JobStatus};

const WEEKLY_BUCKETS: u64 = 8;
const MONTHLY_BUCKETS: u32 = 6;
const TOP_COMPANY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
    #[serde(rename = "6m")]
    Last6Months,
    #[serde(rename = "1y")]
    LastYear,
    #[default]
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    /// Unknown or missing tags select `All`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            Some("30d") => DateRange::Last30Days,
            Some("90d") => DateRange::Last90Days,
            Some("6m") => DateRange::Last6Months,
            Some("1y") => DateRange::LastYear,
            _ => DateRange::All,
        }
    }

    /// Earliest `dateApplied` kept by this range, or `None` for no bound.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateRange::Last30Days => Some(now - Duration::days(30)),
            DateRange::Last90Days => Some(now - Duration::days(90)),
            DateRange::Last6Months => now.checked_sub_months(Months::new(6)),
            DateRange::LastYear => now.checked_sub_months(Months::new(12)),
            DateRange::All => None,
        }
    }

    pub fn contains(&self, job: &JobApplication, now: DateTime<Utc>) -> bool {
        self.cutoff(now)
            .map_or(true, |cutoff| job.date_applied >= cutoff)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusShare {
    pub status: JobStatus,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyBucket {
    /// `M/D` of the first day in the bucket.
    pub week: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBucket {
    /// Short month name, e.g. `Jan`.
    pub month: String,
    pub year: i32,
    pub applied: usize,
    pub interviews: usize,
    pub offers: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStat {
    pub company: String,
    pub applications: usize,
    /// Share of applications that reached Interviewing or Offer.
    pub success_rate: u32,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRates {
    pub application_to_interview: u32,
    pub interview_to_offer: u32,
    pub overall_success: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub range: DateRange,
    pub total_applications: usize,
    pub status_distribution: Vec<StatusShare>,
    pub weekly_applications: Vec<WeeklyBucket>,
    pub monthly_trends: Vec<MonthlyBucket>,
    pub top_companies: Vec<CompanyStat>,
    pub conversion_rates: ConversionRates,
}

/// `part / whole` as a rounded whole percentage; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

pub fn compute_analytics(
    jobs: &[JobApplication],
    range: DateRange,
    now: DateTime<Utc>,
) -> AnalyticsSummary {
    let filtered: Vec<&JobApplication> = jobs.iter().filter(|j| range.contains(j, now)).collect();
    let total = filtered.len();

    AnalyticsSummary {
        range,
        total_applications: total,
        status_distribution: status_distribution(&filtered),
        weekly_applications: weekly_buckets(&filtered, now.date_naive()),
        monthly_trends: monthly_buckets(&filtered, now.date_naive()),
        top_companies: top_companies(&filtered),
        conversion_rates: conversion_rates(&filtered),
    }
}

fn status_distribution(jobs: &[&JobApplication]) -> Vec<StatusShare> {
    JobStatus::ALL
        .into_iter()
        .map(|status| {
            let count = jobs.iter().filter(|j| j.status == status).count();
            StatusShare {
                status,
                count,
                percentage: percentage(count, jobs.len()),
            }
        })
        .collect()
}

/// Eight trailing 7-day windows, oldest first; the last one ends today. Each
/// is labelled by its start date.
fn weekly_buckets(jobs: &[&JobApplication], today: NaiveDate) -> Vec<WeeklyBucket> {
    (0..WEEKLY_BUCKETS)
        .rev()
        .filter_map(|i| {
            let end = today.checked_sub_days(Days::new(i * 7))?;
            let start = end.checked_sub_days(Days::new(6))?;
            let count = jobs
                .iter()
                .filter(|j| {
                    let d = j.date_applied.date_naive();
                    d >= start && d <= end
                })
                .count();
            Some(WeeklyBucket {
                week: start.format("%-m/%-d").to_string(),
                start,
                end,
                count,
            })
        })
        .collect()
}

/// Oldest month first; the last bucket is the current calendar month.
fn monthly_buckets(jobs: &[&JobApplication], today: NaiveDate) -> Vec<MonthlyBucket> {
    let Some(this_month) = today.with_day(1) else {
        return vec![];
    };

    (0..MONTHLY_BUCKETS)
        .rev()
        .filter_map(|i| {
            let first = this_month.checked_sub_months(Months::new(i))?;
            let in_month: Vec<_> = jobs
                .iter()
                .filter(|j| {
                    let d = j.date_applied.date_naive();
                    d.year() == first.year() && d.month() == first.month()
                })
                .collect();
            Some(MonthlyBucket {
                month: first.format("%b").to_string(),
                year: first.year(),
                applied: in_month.len(),
                interviews: in_month
                    .iter()
                    .filter(|j| j.status == JobStatus::Interviewing)
                    .count(),
                offers: in_month
                    .iter()
                    .filter(|j| j.status == JobStatus::Offer)
                    .count(),
            })
        })
        .collect()
}

/// Up to five companies by application count; ties go to the name that sorts first.
fn top_companies(jobs: &[&JobApplication]) -> Vec<CompanyStat> {
    let mut by_company: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for job in jobs {
        let entry = by_company.entry(job.company.as_str()).or_default();
        entry.0 += 1;
        if job.status.is_response() {
            entry.1 += 1;
        }
    }

    let mut stats: Vec<CompanyStat> = by_company
        .into_iter()
        .map(|(company, (total, responses))| CompanyStat {
            company: company.to_string(),
            applications: total,
            success_rate: percentage(responses, total),
        })
        .collect();

    // Stable sort keeps the BTreeMap's name order within equal counts.
    stats.sort_by(|a, b| b.applications.cmp(&a.applications));
    stats.truncate(TOP_COMPANY_LIMIT);
    stats
}

fn conversion_rates(jobs: &[&JobApplication]) -> ConversionRates {
    let total = jobs.len();
    let interviews = jobs.iter().filter(|j| j.status.is_response()).count();
    let offers = jobs.iter().filter(|j| j.status == JobStatus::Offer).count();

    ConversionRates {
        application_to_interview: percentage(interviews, total),
        interview_to_offer: percentage(offers, interviews),
        overall_success: percentage(offers, total),
    }
}
