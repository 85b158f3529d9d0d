//! Logbook service
//!
//! Interns write daily entries; mentors approve or reject them. Status
//! transitions are ordinary updates in the audit trail.

use chrono::NaiveDate;

use crate::audit::{Auditor, RequestContext};
use crate::error::{AuditError, AuditResult};
use crate::models::{Logbook, LogbookId, LogbookStatus, UserId};
use crate::storage::Storage;

/// Partial update of an entry
#[derive(Debug, Clone, Default)]
pub struct LogbookChanges {
    pub date: Option<NaiveDate>,
    pub activity: Option<String>,
    pub description: Option<String>,
    pub duration_hours: Option<f64>,
}

/// Service for logbook entries
pub struct LogbookService<'a> {
    storage: &'a Storage,
    auditor: &'a Auditor,
}

impl<'a> LogbookService<'a> {
    pub fn new(storage: &'a Storage, auditor: &'a Auditor) -> Self {
        Self { storage, auditor }
    }

    /// Write a new draft entry for an intern
    pub fn create(
        &self,
        user_id: UserId,
        date: NaiveDate,
        activity: &str,
        duration_hours: f64,
        description: Option<String>,
        ctx: &RequestContext,
    ) -> AuditResult<Logbook> {
        self.storage
            .users
            .get(user_id)?
            .ok_or_else(|| AuditError::user_not_found(user_id.to_string()))?;

        let mut entry = Logbook::new(user_id, date, activity.trim(), duration_hours);
        if let Some(description) = description {
            entry.description = description;
        }

        entry
            .validate()
            .map_err(|e| AuditError::Validation(e.to_string()))?;

        self.commit(&entry)?;
        self.auditor.on_create(&entry, ctx);

        Ok(entry)
    }

    /// Edit an entry that has not been approved yet
    pub fn update(
        &self,
        id: LogbookId,
        changes: LogbookChanges,
        ctx: &RequestContext,
    ) -> AuditResult<Logbook> {
        let entry = self.require(id)?;
        if entry.status == LogbookStatus::Approved {
            return Err(AuditError::Validation(
                "Approved logbook entries cannot be edited".into(),
            ));
        }

        self.transition(entry, ctx, |entry| {
            if let Some(date) = changes.date {
                entry.date = date;
            }
            if let Some(activity) = changes.activity {
                entry.activity = activity.trim().to_string();
            }
            if let Some(description) = changes.description {
                entry.description = description;
            }
            if let Some(hours) = changes.duration_hours {
                entry.duration_hours = hours;
            }
            entry.touch();
        })
    }

    /// Hand a draft to the mentor
    pub fn submit(&self, id: LogbookId, ctx: &RequestContext) -> AuditResult<Logbook> {
        let entry = self.require(id)?;
        if !matches!(entry.status, LogbookStatus::Draft | LogbookStatus::Rejected) {
            return Err(AuditError::Validation(format!(
                "Cannot submit a logbook entry that is {}",
                entry.status
            )));
        }

        self.transition(entry, ctx, Logbook::submit)
    }

    /// Mentor sign-off
    pub fn approve(
        &self,
        id: LogbookId,
        mentor: UserId,
        notes: Option<String>,
        ctx: &RequestContext,
    ) -> AuditResult<Logbook> {
        let entry = self.require_submitted(id)?;
        self.transition(entry, ctx, |entry| entry.approve(mentor, notes))
    }

    pub fn reject(
        &self,
        id: LogbookId,
        mentor: UserId,
        notes: Option<String>,
        ctx: &RequestContext,
    ) -> AuditResult<Logbook> {
        let entry = self.require_submitted(id)?;
        self.transition(entry, ctx, |entry| entry.reject(mentor, notes))
    }

    pub fn get(&self, id: LogbookId) -> AuditResult<Option<Logbook>> {
        self.storage.logbooks.get(id)
    }

    pub fn list_for(&self, user_id: UserId) -> AuditResult<Vec<Logbook>> {
        self.storage.logbooks.get_by_user(user_id)
    }

    /// Apply a mutation, validate, commit and record the update
    fn transition<F>(&self, mut entry: Logbook, ctx: &RequestContext, mutate: F) -> AuditResult<Logbook>
    where
        F: FnOnce(&mut Logbook),
    {
        let original = self.auditor.capture_original(&entry);
        mutate(&mut entry);

        entry
            .validate()
            .map_err(|e| AuditError::Validation(e.to_string()))?;

        self.commit(&entry)?;

        if let Some(original) = original {
            self.auditor.on_update(&entry, &original, ctx);
        }

        Ok(entry)
    }

    fn commit(&self, entry: &Logbook) -> AuditResult<()> {
        self.storage.logbooks.upsert(entry.clone())?;
        self.storage.logbooks.save()
    }

    fn require(&self, id: LogbookId) -> AuditResult<Logbook> {
        self.storage
            .logbooks
            .get(id)?
            .ok_or_else(|| AuditError::logbook_not_found(id.to_string()))
    }

    fn require_submitted(&self, id: LogbookId) -> AuditResult<Logbook> {
        let entry = self.require(id)?;
        if entry.status != LogbookStatus::Submitted {
            return Err(AuditError::Validation(format!(
                "Only submitted entries can be reviewed (this one is {})",
                entry.status
            )));
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, AuditStore, Criteria, MemoryAuditStore, PageRequest};
    use crate::config::paths::AuditPaths;
    use crate::models::{default_registry, User, UserRole};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        storage: Storage,
        store: Arc<MemoryAuditStore>,
        auditor: Auditor,
        intern: UserId,
        mentor: UserId,
    }

    fn setup() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        let intern = User::new("Sari", "sari@portal.id", UserRole::Intern);
        let mentor = User::new("Bima", "bima@portal.id", UserRole::Mentor);
        let (intern_id, mentor_id) = (intern.id, mentor.id);
        storage.users.upsert(intern).unwrap();
        storage.users.upsert(mentor).unwrap();

        let store = Arc::new(MemoryAuditStore::new());
        let auditor = Auditor::new(store.clone()).with_registry(default_registry());
        Fixture {
            _temp_dir: temp_dir,
            storage,
            store,
            auditor,
            intern: intern_id,
            mentor: mentor_id,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_review_flow_is_audited() {
        let f = setup();
        let service = LogbookService::new(&f.storage, &f.auditor);
        let as_intern = RequestContext::for_user(f.intern);
        let as_mentor = RequestContext::for_user(f.mentor);

        let entry = service
            .create(f.intern, day(), "Set up CI", 6.0, None, &as_intern)
            .unwrap();
        service.submit(entry.id, &as_intern).unwrap();
        let approved = service
            .approve(entry.id, f.mentor, Some("Nice".into()), &as_mentor)
            .unwrap();
        assert_eq!(approved.status, LogbookStatus::Approved);

        let updates = f
            .store
            .query(
                &Criteria::new()
                    .by_action(AuditAction::Updated)
                    .by_actor(f.mentor),
                PageRequest::first(10),
            )
            .unwrap();
        assert_eq!(updates.total, 1);
        let diff = updates.items[0].computed_diff();
        assert_eq!(diff.get("status").unwrap().old, json!("submitted"));
        assert_eq!(diff.get("status").unwrap().new, json!("approved"));
    }

    #[test]
    fn test_approved_entries_are_frozen() {
        let f = setup();
        let service = LogbookService::new(&f.storage, &f.auditor);
        let ctx = RequestContext::for_user(f.intern);
        let entry = service
            .create(f.intern, day(), "Set up CI", 6.0, None, &ctx)
            .unwrap();

        assert!(service.approve(entry.id, f.mentor, None, &ctx).is_err());
        service.submit(entry.id, &ctx).unwrap();
        service.approve(entry.id, f.mentor, None, &ctx).unwrap();

        let changes = LogbookChanges {
            duration_hours: Some(7.0),
            ..Default::default()
        };
        assert!(service.update(entry.id, changes, &ctx).is_err());
    }

    #[test]
    fn test_invalid_hours_rejected() {
        let f = setup();
        let service = LogbookService::new(&f.storage, &f.auditor);
        let ctx = RequestContext::for_user(f.intern);

        let err = service
            .create(f.intern, day(), "Marathon", 30.0, None, &ctx)
            .unwrap_err();
        assert!(matches!(err, AuditError::Validation(_)));
        assert_eq!(f.store.count().unwrap(), 0);
    }

    #[test]
    fn test_unknown_intern_is_not_found() {
        let f = setup();
        let service = LogbookService::new(&f.storage, &f.auditor);
        let err = service
            .create(UserId::new(), day(), "Set up CI", 6.0, None, &RequestContext::system())
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
