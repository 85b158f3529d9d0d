//! Logbook repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{AuditError, AuditResult};
use crate::models::{Logbook, LogbookId, UserId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct LogbookData {
    logbooks: Vec<Logbook>,
}

/// Repository for logbook persistence
pub struct LogbookRepository {
    path: PathBuf,
    data: RwLock<HashMap<LogbookId, Logbook>>,
}

fn lock_err(e: impl std::fmt::Display) -> AuditError {
    AuditError::Storage(format!("Failed to acquire lock: {}", e))
}

impl LogbookRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> AuditResult<()> {
        let file_data: LogbookData = read_json(&self.path)?;
        let mut data = self.data.write().map_err(lock_err)?;
        data.clear();
        for logbook in file_data.logbooks {
            data.insert(logbook.id, logbook);
        }
        Ok(())
    }

    pub fn save(&self) -> AuditResult<()> {
        let data = self.data.read().map_err(lock_err)?;
        let mut logbooks: Vec<_> = data.values().cloned().collect();
        logbooks.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        write_json_atomic(&self.path, &LogbookData { logbooks })
    }

    pub fn get(&self, id: LogbookId) -> AuditResult<Option<Logbook>> {
        let data = self.data.read().map_err(lock_err)?;
        Ok(data.get(&id).cloned())
    }

    /// Entries written by one intern, oldest first
    pub fn get_by_user(&self, user_id: UserId) -> AuditResult<Vec<Logbook>> {
        let data = self.data.read().map_err(lock_err)?;
        let mut entries: Vec<_> = data
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(entries)
    }

    pub fn upsert(&self, logbook: Logbook) -> AuditResult<()> {
        let mut data = self.data.write().map_err(lock_err)?;
        data.insert(logbook.id, logbook);
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
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_get_by_user_sorted_by_date() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LogbookRepository::new(temp_dir.path().join("logbooks.json"));
        let intern = UserId::new();

        let later = Logbook::new(intern, NaiveDate::from_ymd_opt(2026, 3, 3).unwrap(), "Review", 4.0);
        let earlier = Logbook::new(intern, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), "Setup", 8.0);
        let other = Logbook::new(UserId::new(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), "X", 1.0);
        repo.upsert(later).unwrap();
        repo.upsert(earlier).unwrap();
        repo.upsert(other).unwrap();

        let entries = repo.get_by_user(intern).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].activity, "Setup");
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logbooks.json");
        let repo = LogbookRepository::new(path.clone());
        let entry = Logbook::new(UserId::new(), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(), "Setup", 8.0);
        let id = entry.id;
        repo.upsert(entry).unwrap();
        repo.save().unwrap();

        let repo2 = LogbookRepository::new(path);
        repo2.load().unwrap();
        assert_eq!(repo2.get(id).unwrap().unwrap().activity, "Setup");
        assert_eq!(repo2.count().unwrap(), 1);
    }
}
