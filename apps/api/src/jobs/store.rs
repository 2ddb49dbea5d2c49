//! Job store — pluggable repository for job application records.
//!
//! Two backends implement `JobRepository`:
//! - `MemoryJobStore`: in-process collection, used by tests and `STORE_BACKEND=memory`.
//! - `JsonFileJobStore`: a single `{ "jobs": [...] }` document rewritten on every mutation.
//!
//! `AppState` holds an `Arc<dyn JobRepository>`, chosen at startup via config.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::jobs::models::{JobApplication, JobPatch, JobStatus, NewJob};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode jobs document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Background write task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Why a persisted document was rejected at load time.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid record: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct JobsDocument {
    #[serde(default)]
    jobs: Vec<JobApplication>,
}

/// The single deserialization boundary for persisted state.
///
/// Status values and timestamps are checked by the typed parse; this adds
/// the record-level invariants the types cannot express.
pub fn parse_document(bytes: &[u8]) -> Result<Vec<JobApplication>, DocumentError> {
    let document: JobsDocument = serde_json::from_slice(bytes)?;

    let mut seen = std::collections::HashSet::new();
    for job in &document.jobs {
        if job.id.trim().is_empty() {
            return Err(DocumentError::Invalid("record with empty id".to_string()));
        }
        if !seen.insert(job.id.as_str()) {
            return Err(DocumentError::Invalid(format!("duplicate id {}", job.id)));
        }
        if job.title.trim().is_empty()
            || job.company.trim().is_empty()
            || job.application_link.trim().is_empty()
        {
            return Err(DocumentError::Invalid(format!(
                "record {} is missing a required field",
                job.id
            )));
        }
    }

    Ok(document.jobs)
}

fn encode_document(jobs: &[JobApplication]) -> Result<Vec<u8>, serde_json::Error> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        jobs: &'a [JobApplication],
    }
    serde_json::to_vec_pretty(&Borrowed { jobs })
}

/// The repository trait. Handlers only see this, never a concrete backend.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// All records in insertion order.
    async fn list(&self) -> Result<Vec<JobApplication>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<JobApplication>, StoreError>;

    async fn create(&self, new_job: NewJob) -> Result<JobApplication, StoreError>;

    /// `Ok(None)` when no record has this id.
    async fn update(&self, id: &str, patch: JobPatch)
        -> Result<Option<JobApplication>, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Called once on graceful shutdown.
    async fn shutdown(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// Collection operations shared by both backends
// ────────────────────────────────────────────────────────────────────────────

fn insert(jobs: &mut Vec<JobApplication>, new_job: NewJob, now: DateTime<Utc>) -> JobApplication {
    let job = JobApplication::from_new(Uuid::new_v4().to_string(), new_job, now);
    jobs.push(job.clone());
    job
}

fn patch_in(
    jobs: &mut [JobApplication],
    id: &str,
    patch: JobPatch,
    now: DateTime<Utc>,
) -> Option<JobApplication> {
    let job = jobs.iter_mut().find(|j| j.id == id)?;
    job.apply(patch, now);
    Some(job.clone())
}

fn remove(jobs: &mut Vec<JobApplication>, id: &str) -> bool {
    let before = jobs.len();
    jobs.retain(|j| j.id != id);
    jobs.len() < before
}

// ────────────────────────────────────────────────────────────────────────────
// MemoryJobStore
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: RwLock<Vec<JobApplication>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: Vec<JobApplication>) -> Self {
        Self {
            jobs: RwLock::new(jobs),
        }
    }
}

#[async_trait]
impl JobRepository for MemoryJobStore {
    async fn list(&self) -> Result<Vec<JobApplication>, StoreError> {
        Ok(self.jobs.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<JobApplication>, StoreError> {
        Ok(self.jobs.read().await.iter().find(|j| j.id == id).cloned())
    }

    async fn create(&self, new_job: NewJob) -> Result<JobApplication, StoreError> {
        let mut jobs = self.jobs.write().await;
        Ok(insert(&mut jobs, new_job, Utc::now()))
    }

    async fn update(
        &self,
        id: &str,
        patch: JobPatch,
    ) -> Result<Option<JobApplication>, StoreError> {
        let mut jobs = self.jobs.write().await;
        Ok(patch_in(&mut jobs, id, patch, Utc::now()))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.write().await;
        Ok(remove(&mut jobs, id))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// JsonFileJobStore
// ────────────────────────────────────────────────────────────────────────────

/// File-backed store. The whole collection is cached in memory and the full
/// document is rewritten (temp file + rename) after each mutation.
///
/// Mutations run against a copy; the cache is only replaced once the write
/// has succeeded, so a failed write leaves both disk and cache unchanged.
pub struct JsonFileJobStore {
    path: PathBuf,
    jobs: RwLock<Vec<JobApplication>>,
}

impl JsonFileJobStore {
    /// Loads the document at `path`. A missing file starts an empty store; a
    /// malformed one is moved aside to `<path>.corrupt` and also starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        let jobs = match tokio::fs::read(&path).await {
            Ok(bytes) => match parse_document(&bytes) {
                Ok(jobs) => jobs,
                Err(e) => {
                    warn!(
                        "Jobs document {} is unreadable ({e}); starting with an empty store",
                        path.display()
                    );
                    quarantine(&path).await;
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No jobs document at {}; starting empty", path.display());
                Vec::new()
            }
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        info!("Loaded {} jobs from {}", jobs.len(), path.display());

        Ok(Self {
            path,
            jobs: RwLock::new(jobs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, jobs: &[JobApplication]) -> Result<(), StoreError> {
        let bytes = encode_document(jobs)?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &bytes)).await??;
        debug!("Wrote {} jobs to {}", jobs.len(), self.path.display());
        Ok(())
    }
}

async fn quarantine(path: &Path) {
    let mut target = path.as_os_str().to_owned();
    target.push(".corrupt");
    let target = PathBuf::from(target);
    match tokio::fs::rename(path, &target).await {
        Ok(()) => warn!("Moved unreadable jobs document to {}", target.display()),
        Err(e) => warn!("Could not move unreadable jobs document aside: {e}"),
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[async_trait]
impl JobRepository for JsonFileJobStore {
    async fn list(&self) -> Result<Vec<JobApplication>, StoreError> {
        Ok(self.jobs.read().await.clone())
    }

    async fn get(&self, id: &str) -> Result<Option<JobApplication>, StoreError> {
        Ok(self.jobs.read().await.iter().find(|j| j.id == id).cloned())
    }

    async fn create(&self, new_job: NewJob) -> Result<JobApplication, StoreError> {
        let mut guard = self.jobs.write().await;
        let mut next = guard.clone();
        let job = insert(&mut next, new_job, Utc::now());
        self.persist(&next).await?;
        *guard = next;
        Ok(job)
    }

    async fn update(
        &self,
        id: &str,
        patch: JobPatch,
    ) -> Result<Option<JobApplication>, StoreError> {
        let mut guard = self.jobs.write().await;
        let mut next = guard.clone();
        let Some(job) = patch_in(&mut next, id, patch, Utc::now()) else {
            return Ok(None);
        };
        self.persist(&next).await?;
        *guard = next;
        Ok(Some(job))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut guard = self.jobs.write().await;
        let mut next = guard.clone();
        if !remove(&mut next, id) {
            return Ok(false);
        }
        self.persist(&next).await?;
        *guard = next;
        Ok(true)
    }

    async fn shutdown(&self) -> Result<(), StoreError> {
        let jobs = self.jobs.read().await;
        info!(
            "Closing jobs document {} ({} records)",
            self.path.display(),
            jobs.len()
        );
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Demo data
// ────────────────────────────────────────────────────────────────────────────

/// Four sample applications covering every status, for `SEED_DEMO_DATA=true`.
pub fn demo_jobs() -> Vec<JobApplication> {
    let day = |d: u32| {
        Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    };
    let sample = |title: &str, company: &str, link: &str, status, applied: u32, updated: u32| {
        JobApplication {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            company: company.to_string(),
            application_link: link.to_string(),
            status,
            date_applied: day(applied),
            created_at: day(applied),
            updated_at: day(updated),
        }
    };

    vec![
        sample(
            "Frontend Developer Intern",
            "TechCorp",
            "https://techcorp.com/careers/frontend-intern",
            JobStatus::Applied,
            15,
            15,
        ),
        sample(
            "Software Engineer Intern",
            "StartupXYZ",
            "https://startupxyz.com/jobs/swe-intern",
            JobStatus::Interviewing,
            20,
            22,
        ),
        sample(
            "Full Stack Developer",
            "InnovateLabs",
            "https://innovatelabs.io/careers",
            JobStatus::Offer,
            25,
            30,
        ),
        sample(
            "Backend Developer",
            "DataSystems Inc",
            "https://datasystems.com/apply",
            JobStatus::Rejected,
            10,
            18,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job(title: &str) -> NewJob {
        NewJob {
            title: title.to_string(),
            company: "Acme".to_string(),
            application_link: "https://acme.example/apply".to_string(),
            status: JobStatus::Applied,
            date_applied: None,
        }
    }

    #[tokio::test]
    async fn test_memory_create_get_delete() {
        let store = MemoryJobStore::new();
        let job = store.create(new_job("Backend Engineer")).await.unwrap();

        let fetched = store.get(&job.id).await.unwrap().unwrap();
        assert_eq!(fetched, job);

        assert!(store.delete(&job.id).await.unwrap());
        assert!(!store.delete(&job.id).await.unwrap());
        assert!(store.get(&job.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_ids_are_unique() {
        let store = MemoryJobStore::new();
        let a = store.create(new_job("A")).await.unwrap();
        let b = store.create(new_job("B")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_memory_update_missing_returns_none() {
        let store = MemoryJobStore::new();
        let patch = JobPatch {
            status: Some(JobStatus::Offer),
            ..Default::default()
        };
        assert!(store.update("nope", patch).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_update_merges_fields() {
        let store = MemoryJobStore::new();
        let job = store.create(new_job("Backend Engineer")).await.unwrap();
        let patch = JobPatch {
            status: Some(JobStatus::Interviewing),
            ..Default::default()
        };
        let updated = store.update(&job.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.status, JobStatus::Interviewing);
        assert_eq!(updated.title, job.title);
        assert_eq!(updated.id, job.id);
        assert!(updated.updated_at >= job.updated_at);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let store = JsonFileJobStore::open(&path).await.unwrap();
        let job = store.create(new_job("Backend Engineer")).await.unwrap();
        drop(store);

        let reopened = JsonFileJobStore::open(&path).await.unwrap();
        let jobs = reopened.list().await.unwrap();
        assert_eq!(jobs, vec![job]);
    }

    #[tokio::test]
    async fn test_file_store_writes_jobs_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("jobs.json");

        let store = JsonFileJobStore::open(&path).await.unwrap();
        store.create(new_job("Backend Engineer")).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let first = &raw["jobs"][0];
        assert_eq!(first["title"], "Backend Engineer");
        assert_eq!(first["applicationLink"], "https://acme.example/apply");
        assert_eq!(first["status"], "Applied");
    }

    #[tokio::test]
    async fn test_file_store_delete_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let store = JsonFileJobStore::open(&path).await.unwrap();
        let job = store.create(new_job("Backend Engineer")).await.unwrap();
        assert!(store.delete(&job.id).await.unwrap());

        let reopened = JsonFileJobStore::open(&path).await.unwrap();
        assert!(reopened.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_failed_write_keeps_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let store = JsonFileJobStore::open(&path).await.unwrap();
        let job = store.create(new_job("Backend Engineer")).await.unwrap();

        // A non-empty directory where the document lives makes the rename fail.
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupied"), b"x").unwrap();

        assert!(matches!(
            store.delete(&job.id).await,
            Err(StoreError::Io { .. })
        ));
        assert!(store.create(new_job("Data Engineer")).await.is_err());
        let patch = JobPatch {
            status: Some(JobStatus::Offer),
            ..Default::default()
        };
        assert!(store.update(&job.id, patch).await.is_err());

        assert_eq!(store.list().await.unwrap(), vec![job]);
    }

    #[tokio::test]
    async fn test_file_store_malformed_document_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonFileJobStore::open(&path).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(dir.path().join("jobs.json.corrupt").exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_parse_document_rejects_bad_status() {
        let raw = br#"{"jobs":[{"id":"1","title":"T","company":"C","applicationLink":"L",
            "status":"Pending","dateApplied":"2025-01-01T00:00:00Z",
            "createdAt":"2025-01-01T00:00:00Z","updatedAt":"2025-01-01T00:00:00Z"}]}"#;
        assert!(matches!(parse_document(raw), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_parse_document_rejects_duplicate_ids() {
        let record = r#"{"id":"1","title":"T","company":"C","applicationLink":"L",
            "status":"Applied","dateApplied":"2025-01-01T00:00:00Z",
            "createdAt":"2025-01-01T00:00:00Z","updatedAt":"2025-01-01T00:00:00Z"}"#;
        let raw = format!(r#"{{"jobs":[{record},{record}]}}"#);
        assert!(matches!(
            parse_document(raw.as_bytes()),
            Err(DocumentError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_document_missing_jobs_key_is_empty() {
        assert!(parse_document(b"{}").unwrap().is_empty());
    }

    #[test]
    fn test_demo_jobs_cover_every_status() {
        let jobs = demo_jobs();
        for status in JobStatus::ALL {
            assert!(jobs.iter().any(|j| j.status == status));
        }
    }
}
