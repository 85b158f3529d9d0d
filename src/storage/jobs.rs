//! Job posting repository for JSON storage
//!
//! Manages loading and saving postings to jobs.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{AuditError, AuditResult};
use crate::models::{JobId, JobPosting};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct JobData {
    jobs: Vec<JobPosting>,
}

/// Repository for job posting persistence
pub struct JobRepository {
    path: PathBuf,
    data: RwLock<HashMap<JobId, JobPosting>>,
    /// Index: slug -> job id
    by_slug: RwLock<HashMap<String, JobId>>,
}

fn lock_err(e: impl std::fmt::Display) -> AuditError {
    AuditError::Storage(format!("Failed to acquire lock: {}", e))
}

impl JobRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_slug: RwLock::new(HashMap::new()),
        }
    }

    /// Load postings from disk
    pub fn load(&self) -> AuditResult<()> {
        let file_data: JobData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(lock_err)?;
        let mut by_slug = self.by_slug.write().map_err(lock_err)?;
        data.clear();
        by_slug.clear();

        for job in file_data.jobs {
            by_slug.insert(job.slug.clone(), job.id);
            data.insert(job.id, job);
        }

        Ok(())
    }

    /// Save postings to disk, oldest first
    pub fn save(&self) -> AuditResult<()> {
        let data = self.data.read().map_err(lock_err)?;

        let mut jobs: Vec<_> = data.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        write_json_atomic(&self.path, &JobData { jobs })
    }

    pub fn get(&self, id: JobId) -> AuditResult<Option<JobPosting>> {
        let data = self.data.read().map_err(lock_err)?;
        Ok(data.get(&id).cloned())
    }

    pub fn get_by_slug(&self, slug: &str) -> AuditResult<Option<JobPosting>> {
        let data = self.data.read().map_err(lock_err)?;
        let by_slug = self.by_slug.read().map_err(lock_err)?;
        Ok(by_slug.get(slug).and_then(|id| data.get(id)).cloned())
    }

    /// All postings, optionally including soft-deleted ones
    pub fn get_all(&self, include_deleted: bool) -> AuditResult<Vec<JobPosting>> {
        let data = self.data.read().map_err(lock_err)?;
        let mut jobs: Vec<_> = data
            .values()
            .filter(|j| include_deleted || !j.is_deleted())
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        Ok(jobs)
    }

    /// Check whether a slug is taken by a posting other than `exclude`
    pub fn slug_exists(&self, slug: &str, exclude: Option<JobId>) -> AuditResult<bool> {
        let by_slug = self.by_slug.read().map_err(lock_err)?;
        Ok(by_slug.get(slug).is_some_and(|id| Some(*id) != exclude))
    }

    /// Insert or update a posting
    pub fn upsert(&self, job: JobPosting) -> AuditResult<()> {
        let mut data = self.data.write().map_err(lock_err)?;
        let mut by_slug = self.by_slug.write().map_err(lock_err)?;

        if let Some(old) = data.get(&job.id) {
            by_slug.remove(&old.slug);
        }
        by_slug.insert(job.slug.clone(), job.id);
        data.insert(job.id, job);
        Ok(())
    }

    pub fn count(&self) -> AuditResult<usize> {
        let data = self.data.read().map_err(lock_err)?;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobType;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, JobRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = JobRepository::new(temp_dir.path().join("jobs.json"));
        (temp_dir, repo)
    }

    #[test]
    fn test_upsert_and_get_by_slug() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let job = JobPosting::new("Backend Intern", JobType::Remote, "Jakarta");
        let id = job.id;
        repo.upsert(job).unwrap();

        assert_eq!(repo.get(id).unwrap().unwrap().title, "Backend Intern");
        assert_eq!(repo.get_by_slug("backend-intern").unwrap().unwrap().id, id);
        assert!(repo.slug_exists("backend-intern", None).unwrap());
        assert!(!repo.slug_exists("backend-intern", Some(id)).unwrap());
    }

    #[test]
    fn test_slug_index_follows_updates() {
        let (_temp_dir, repo) = create_test_repo();
        let mut job = JobPosting::new("Backend Intern", JobType::Remote, "Jakarta");
        repo.upsert(job.clone()).unwrap();

        job.slug = "backend-developer-intern".into();
        repo.upsert(job).unwrap();

        assert!(repo.get_by_slug("backend-intern").unwrap().is_none());
        assert!(repo.get_by_slug("backend-developer-intern").unwrap().is_some());
    }

    #[test]
    fn test_deleted_jobs_hidden_by_default() {
        let (_temp_dir, repo) = create_test_repo();
        let mut job = JobPosting::new("QA Intern", JobType::OnSite, "Bandung");
        job.soft_delete();
        repo.upsert(job).unwrap();
        repo.upsert(JobPosting::new("Data Intern", JobType::Hybrid, "Bandung"))
            .unwrap();

        assert_eq!(repo.get_all(false).unwrap().len(), 1);
        assert_eq!(repo.get_all(true).unwrap().len(), 2);
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let job = JobPosting::new("Backend Intern", JobType::Remote, "Jakarta");
        let id = job.id;
        repo.upsert(job).unwrap();
        repo.save().unwrap();

        let repo2 = JobRepository::new(temp_dir.path().join("jobs.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get(id).unwrap().unwrap().slug, "backend-intern");
        assert_eq!(repo2.count().unwrap(), 1);
    }
}
