//! Storage layer for the portal's domain entities
//!
//! Each entity family lives in its own JSON document written atomically.
//! The audit trail has its own append-only store under `crate::audit::store`.

pub mod file_io;
pub mod jobs;
pub mod logbooks;
pub mod users;

pub use file_io::{read_json, write_json_atomic};
pub use jobs::JobRepository;
pub use logbooks::LogbookRepository;
pub use users::UserRepository;

use crate::config::paths::AuditPaths;
use crate::error::AuditResult;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: AuditPaths,
    pub jobs: JobRepository,
    pub users: UserRepository,
    pub logbooks: LogbookRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: AuditPaths) -> AuditResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            jobs: JobRepository::new(paths.jobs_file()),
            users: UserRepository::new(paths.users_file()),
            logbooks: LogbookRepository::new(paths.logbooks_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &AuditPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> AuditResult<()> {
        self.jobs.load()?;
        self.users.load()?;
        self.logbooks.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> AuditResult<()> {
        self.jobs.save()?;
        self.users.save()?;
        self.logbooks.save()?;
        Ok(())
    }
}
