//! Job posting model
//!
//! Internship vacancies published on the portal. Postings are soft-deleted
//! so they can be restored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::JobId;
use crate::audit::Auditable;

/// How the internship is carried out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    #[default]
    OnSite,
    Remote,
    Hybrid,
}

impl JobType {
    /// Parse job type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "on-site" | "onsite" | "office" => Some(Self::OnSite),
            "remote" => Some(Self::Remote),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnSite => write!(f, "On-site"),
            Self::Remote => write!(f, "Remote"),
            Self::Hybrid => write!(f, "Hybrid"),
        }
    }
}

/// Whether the posting accepts applications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
}

impl JobStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(Self::Open),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// An internship vacancy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,

    pub title: String,

    /// URL-safe identifier derived from the title at creation
    pub slug: String,

    #[serde(rename = "type")]
    pub job_type: JobType,

    pub status: JobStatus,

    pub location: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub requirements: Vec<String>,

    /// Last day applications are accepted
    pub deadline: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Set when the posting is soft-deleted
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl JobPosting {
    /// Create a new open posting
    pub fn new(title: impl Into<String>, job_type: JobType, location: impl Into<String>) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: JobId::new(),
            slug: slugify(&title),
            title,
            job_type,
            status: JobStatus::Open,
            location: location.into(),
            description: String::new(),
            requirements: Vec::new(),
            deadline: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Bump the modification timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn close(&mut self) {
        self.status = JobStatus::Closed;
        self.touch();
    }

    pub fn reopen(&mut self) {
        self.status = JobStatus::Open;
        self.touch();
    }

    pub fn soft_delete(&mut self) {
        self.deleted_at = Some(Utc::now());
        self.touch();
    }

    pub fn restore(&mut self) {
        self.deleted_at = None;
        self.touch();
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Open, not deleted, and not past its deadline
    pub fn is_accepting(&self, today: NaiveDate) -> bool {
        self.status == JobStatus::Open
            && !self.is_deleted()
            && self.deadline.map_or(true, |d| d >= today)
    }

    /// Validate the posting
    pub fn validate(&self) -> Result<(), JobValidationError> {
        if self.title.trim().is_empty() {
            return Err(JobValidationError::EmptyTitle);
        }

        if self.title.chars().count() > 255 {
            return Err(JobValidationError::TitleTooLong(self.title.chars().count()));
        }

        if self.location.trim().is_empty() {
            return Err(JobValidationError::EmptyLocation);
        }

        if self.slug.is_empty() {
            return Err(JobValidationError::InvalidSlug);
        }

        Ok(())
    }
}

impl Auditable for JobPosting {
    const TYPE_TAG: &'static str = "models::JobPosting";

    fn primary_key(&self) -> String {
        self.id.as_uuid().to_string()
    }
}

impl fmt::Display for JobPosting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.title, self.job_type, self.location)
    }
}

/// Lowercase, hyphen-separated form of a title
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Validation errors for job postings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobValidationError {
    EmptyTitle,
    TitleTooLong(usize),
    EmptyLocation,
    InvalidSlug,
}

impl fmt::Display for JobValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "Job title cannot be empty"),
            Self::TitleTooLong(len) => write!(f, "Job title too long ({} chars, max 255)", len),
            Self::EmptyLocation => write!(f, "Job location cannot be empty"),
            Self::InvalidSlug => write!(f, "Job title must contain letters or digits"),
        }
    }
}

impl std::error::Error for JobValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job() {
        let job = JobPosting::new("Backend Intern", JobType::Remote, "Jakarta");
        assert_eq!(job.slug, "backend-intern");
        assert_eq!(job.status, JobStatus::Open);
        assert!(!job.is_deleted());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  UI/UX Design -- Intern "), "ui-ux-design-intern");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_soft_delete_and_restore() {
        let mut job = JobPosting::new("Data Intern", JobType::Hybrid, "Bandung");
        job.soft_delete();
        assert!(job.is_deleted());
        job.restore();
        assert!(!job.is_deleted());
    }

    #[test]
    fn test_is_accepting() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let mut job = JobPosting::new("QA Intern", JobType::OnSite, "Surabaya");
        job.deadline = NaiveDate::from_ymd_opt(2026, 5, 31);
        assert!(!job.is_accepting(today));

        job.deadline = Some(today);
        assert!(job.is_accepting(today));

        job.close();
        assert!(!job.is_accepting(today));
    }

    #[test]
    fn test_validation() {
        let mut job = JobPosting::new("Backend Intern", JobType::Remote, "Jakarta");
        assert!(job.validate().is_ok());

        job.location = " ".into();
        assert_eq!(job.validate(), Err(JobValidationError::EmptyLocation));

        job.title = String::new();
        assert_eq!(job.validate(), Err(JobValidationError::EmptyTitle));
    }

    #[test]
    fn test_snapshot_uses_wire_names() {
        let job = JobPosting::new("Backend Intern", JobType::OnSite, "Jakarta");
        let snapshot = job.snapshot().unwrap();
        assert_eq!(snapshot.get("type"), Some(&serde_json::json!("on-site")));
        assert_eq!(snapshot.get("title"), Some(&serde_json::json!("Backend Intern")));
        assert_eq!(job.primary_key(), job.id.as_uuid().to_string());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!(JobType::parse("on_site"), Some(JobType::OnSite));
        assert_eq!(JobType::parse("REMOTE"), Some(JobType::Remote));
        assert_eq!(JobStatus::parse("closed"), Some(JobStatus::Closed));
        assert_eq!(JobStatus::parse("draft"), None);
    }
}
