//! Append-only audit record storage
//!
//! Stores expose `append` plus read-only queries. Records are never updated
//! or deleted.

mod index;
mod jsonl;
mod memory;

pub use index::AuditIndex;
pub use jsonl::JsonlAuditStore;
pub use memory::MemoryAuditStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use super::action::AuditAction;
use super::record::AuditRecord;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecordId, UserId};

/// Persistence backend for audit records
pub trait AuditStore: Send + Sync {
    /// Persist a record. Fails with `AuditError::Persist`.
    fn append(&self, record: AuditRecord) -> AuditResult<()>;

    fn get(&self, id: AuditRecordId) -> AuditResult<Option<AuditRecord>>;

    /// Matching records, newest first
    fn query(&self, criteria: &Criteria, page: PageRequest) -> AuditResult<Page<AuditRecord>>;

    fn count(&self) -> AuditResult<usize>;

    /// Actors that appear in at least one record
    fn distinct_actors(&self) -> AuditResult<Vec<UserId>>;

    /// Subject type tags that appear in at least one record, sorted
    fn distinct_subject_types(&self) -> AuditResult<Vec<String>>;

    /// Action codes that appear in at least one record, sorted
    fn distinct_actions(&self) -> AuditResult<Vec<String>>;
}

/// Free-text term matched against address, path and resolved actors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchTerm {
    needle: String,
    actor_ids: HashSet<UserId>,
}

impl SearchTerm {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.trim().to_lowercase(),
            actor_ids: HashSet::new(),
        }
    }

    /// Actors whose name or contact matched the term
    pub fn with_actors(mut self, actors: impl IntoIterator<Item = UserId>) -> Self {
        self.actor_ids.extend(actors);
        self
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    fn matches(&self, record: &AuditRecord) -> bool {
        let contains = |value: Option<&str>| {
            value.is_some_and(|v| v.to_lowercase().contains(&self.needle))
        };

        contains(record.network_address())
            || contains(record.request_path())
            || record
                .actor_id()
                .is_some_and(|actor| self.actor_ids.contains(&actor))
    }
}

/// Conjunction of record predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub action: Option<AuditAction>,
    pub actor_id: Option<UserId>,
    /// Lowercased substring of the subject type tag
    pub subject_type_contains: Option<String>,
    /// Exact (subject type, subject id) pair
    pub subject: Option<(String, String)>,
    pub network_address: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub search: Option<SearchTerm>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn by_actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn subject_type_like(mut self, fragment: &str) -> Self {
        self.subject_type_contains = Some(fragment.trim().to_lowercase());
        self
    }

    pub fn for_subject(mut self, subject_type: &str, subject_id: &str) -> Self {
        self.subject = Some((subject_type.to_string(), subject_id.to_string()));
        self
    }

    pub fn from_address(mut self, address: &str) -> Self {
        self.network_address = Some(address.to_string());
        self
    }

    /// Inclusive creation range; either bound may be open
    pub fn created_between(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn matching(mut self, term: SearchTerm) -> Self {
        self.search = Some(term);
        self
    }

    /// Check if a record satisfies every predicate
    pub fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(action) = &self.action {
            if record.action() != action {
                return false;
            }
        }

        if let Some(actor) = self.actor_id {
            if record.actor_id() != Some(actor) {
                return false;
            }
        }

        if let Some(fragment) = &self.subject_type_contains {
            if !record.subject_type().to_lowercase().contains(fragment.as_str()) {
                return false;
            }
        }

        if let Some((subject_type, subject_id)) = &self.subject {
            if record.subject_type() != subject_type
                || record.subject_id() != Some(subject_id.as_str())
            {
                return false;
            }
        }

        if let Some(address) = &self.network_address {
            if record.network_address() != Some(address.as_str()) {
                return false;
            }
        }

        if let Some(from) = self.created_from {
            if record.created_at() < from {
                return false;
            }
        }

        if let Some(to) = self.created_to {
            if record.created_at() > to {
                return false;
            }
        }

        if let Some(term) = &self.search {
            if !term.needle.is_empty() && !term.matches(record) {
                return false;
            }
        }

        true
    }
}

/// 1-based page selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl PageRequest {
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page, per_page }
    }

    /// First page of the given size
    pub fn first(per_page: usize) -> Self {
        Self::new(1, per_page)
    }

    pub fn validate(&self) -> AuditResult<()> {
        if self.page == 0 {
            return Err(AuditError::QueryValidation(
                "page numbers start at 1".into(),
            ));
        }
        if self.per_page == 0 {
            return Err(AuditError::QueryValidation(
                "page size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of results plus the total match count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn last_page(&self) -> usize {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn has_more(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}
