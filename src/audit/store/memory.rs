//! Volatile audit store

use std::sync::RwLock;

use super::{AuditIndex, AuditStore, Criteria, Page, PageRequest};
use crate::audit::record::AuditRecord;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecordId, UserId};

/// Audit store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    index: RwLock<AuditIndex>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AuditResult<std::sync::RwLockReadGuard<'_, AuditIndex>> {
        self.index
            .read()
            .map_err(|e| AuditError::Storage(format!("Failed to acquire read lock: {}", e)))
    }
}

impl AuditStore for MemoryAuditStore {
    fn append(&self, record: AuditRecord) -> AuditResult<()> {
        let mut index = self
            .index
            .write()
            .map_err(|e| AuditError::Persist(format!("Failed to acquire write lock: {}", e)))?;
        index.insert(record)
    }

    fn get(&self, id: AuditRecordId) -> AuditResult<Option<AuditRecord>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn query(&self, criteria: &Criteria, page: PageRequest) -> AuditResult<Page<AuditRecord>> {
        self.read()?.query(criteria, page)
    }

    fn count(&self) -> AuditResult<usize> {
        Ok(self.read()?.len())
    }

    fn distinct_actors(&self) -> AuditResult<Vec<UserId>> {
        Ok(self.read()?.distinct_actors())
    }

    fn distinct_subject_types(&self) -> AuditResult<Vec<String>> {
        Ok(self.read()?.distinct_subject_types())
    }

    fn distinct_actions(&self) -> AuditResult<Vec<String>> {
        Ok(self.read()?.distinct_actions())
    }
}
