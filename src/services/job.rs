//! Job posting service
//!
//! Create, edit, soft-delete and restore vacancies. Each committed change is
//! handed to the auditor.

use chrono::NaiveDate;

use crate::audit::{Auditor, RequestContext};
use crate::error::{AuditError, AuditResult};
use crate::models::{JobId, JobPosting, JobStatus, JobType};
use crate::storage::Storage;

/// Fields of a new posting
#[derive(Debug, Clone)]
pub struct JobInput {
    pub title: String,
    pub job_type: JobType,
    pub location: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub deadline: Option<NaiveDate>,
}

impl JobInput {
    pub fn new(title: impl Into<String>, job_type: JobType, location: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            job_type,
            location: location.into(),
            description: String::new(),
            requirements: Vec::new(),
            deadline: None,
        }
    }
}

/// Partial update of a posting; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub job_type: Option<JobType>,
    pub status: Option<JobStatus>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    /// `Some(None)` clears the deadline
    pub deadline: Option<Option<NaiveDate>>,
}

impl JobChanges {
    fn apply(self, job: &mut JobPosting) {
        if let Some(title) = self.title {
            job.title = title.trim().to_string();
        }
        if let Some(job_type) = self.job_type {
            job.job_type = job_type;
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(location) = self.location {
            job.location = location.trim().to_string();
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(requirements) = self.requirements {
            job.requirements = requirements;
        }
        if let Some(deadline) = self.deadline {
            job.deadline = deadline;
        }
    }
}

/// Service for job posting management
pub struct JobService<'a> {
    storage: &'a Storage,
    auditor: &'a Auditor,
}

impl<'a> JobService<'a> {
    pub fn new(storage: &'a Storage, auditor: &'a Auditor) -> Self {
        Self { storage, auditor }
    }

    /// Publish a new posting
    pub fn create(&self, input: JobInput, ctx: &RequestContext) -> AuditResult<JobPosting> {
        let mut job = JobPosting::new(input.title.trim(), input.job_type, input.location.trim());
        job.description = input.description;
        job.requirements = input.requirements;
        job.deadline = input.deadline;

        job.validate()
            .map_err(|e| AuditError::Validation(e.to_string()))?;

        if self.storage.jobs.slug_exists(&job.slug, None)? {
            return Err(AuditError::Duplicate {
                entity_type: "Job",
                identifier: job.slug.clone(),
            });
        }

        self.storage.jobs.upsert(job.clone())?;
        self.storage.jobs.save()?;

        self.auditor.on_create(&job, ctx);

        Ok(job)
    }

    /// Edit a posting. The slug stays stable across title changes.
    pub fn update(&self, id: JobId, changes: JobChanges, ctx: &RequestContext) -> AuditResult<JobPosting> {
        let mut job = self.require(id)?;
        let original = self.auditor.capture_original(&job);

        changes.apply(&mut job);
        job.touch();

        job.validate()
            .map_err(|e| AuditError::Validation(e.to_string()))?;

        self.storage.jobs.upsert(job.clone())?;
        self.storage.jobs.save()?;

        if let Some(original) = original {
            self.auditor.on_update(&job, &original, ctx);
        }

        Ok(job)
    }

    /// Soft-delete a posting
    pub fn delete(&self, id: JobId, ctx: &RequestContext) -> AuditResult<JobPosting> {
        let mut job = self.require(id)?;
        if job.is_deleted() {
            return Err(AuditError::Validation(format!(
                "Job '{}' is already deleted",
                job.title
            )));
        }

        job.soft_delete();
        self.storage.jobs.upsert(job.clone())?;
        self.storage.jobs.save()?;

        self.auditor.on_delete(&job, ctx);

        Ok(job)
    }

    /// Bring back a soft-deleted posting
    pub fn restore(&self, id: JobId, ctx: &RequestContext) -> AuditResult<JobPosting> {
        let mut job = self.require(id)?;
        if !job.is_deleted() {
            return Err(AuditError::Validation(format!(
                "Job '{}' is not deleted",
                job.title
            )));
        }

        job.restore();
        self.storage.jobs.upsert(job.clone())?;
        self.storage.jobs.save()?;

        self.auditor.on_restore(&job, ctx);

        Ok(job)
    }

    pub fn get(&self, id: JobId) -> AuditResult<Option<JobPosting>> {
        self.storage.jobs.get(id)
    }

    /// Find a posting by slug or ID
    pub fn find(&self, identifier: &str) -> AuditResult<Option<JobPosting>> {
        if let Some(job) = self.storage.jobs.get_by_slug(identifier)? {
            return Ok(Some(job));
        }

        if let Ok(id) = identifier.parse::<JobId>() {
            return self.storage.jobs.get(id);
        }

        Ok(None)
    }

    pub fn list(&self, include_deleted: bool) -> AuditResult<Vec<JobPosting>> {
        self.storage.jobs.get_all(include_deleted)
    }

    fn require(&self, id: JobId) -> AuditResult<JobPosting> {
        self.storage
            .jobs
            .get(id)?
            .ok_or_else(|| AuditError::job_not_found(id.to_string()))
    }
}
