//! In-memory secondary indices over audit records
//!
//! Rows are stored once; every index holds row positions. A query takes the
//! smallest equality-index posting list as its candidate set and falls back
//! to a reverse scan of the time index when no equality predicate is present.

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use uuid::Uuid;

use super::{Criteria, Page, PageRequest};
use crate::audit::record::AuditRecord;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecordId, UserId};

type TimeKey = (DateTime<Utc>, AuditRecordId);

/// Indexed, insert-only collection of audit records
#[derive(Debug, Default)]
pub struct AuditIndex {
    rows: Vec<AuditRecord>,
    by_id: HashMap<AuditRecordId, usize>,
    by_time: BTreeMap<TimeKey, usize>,
    by_actor: HashMap<UserId, Vec<usize>>,
    by_action: HashMap<String, Vec<usize>>,
    by_subject_type: BTreeMap<String, Vec<usize>>,
    by_subject: HashMap<(String, String), Vec<usize>>,
    by_address: HashMap<String, Vec<usize>>,
}

impl AuditIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: AuditRecordId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Add a record to every index
    pub fn insert(&mut self, record: AuditRecord) -> AuditResult<()> {
        if self.contains(record.id()) {
            return Err(AuditError::Persist(format!(
                "duplicate audit record id {}",
                record.id()
            )));
        }

        let row = self.rows.len();
        self.by_id.insert(record.id(), row);
        self.by_time.insert(record.sort_key(), row);

        if let Some(actor) = record.actor_id() {
            self.by_actor.entry(actor).or_default().push(row);
        }
        self.by_action
            .entry(record.action().code().to_string())
            .or_default()
            .push(row);
        self.by_subject_type
            .entry(record.subject_type().to_string())
            .or_default()
            .push(row);
        if let Some(subject_id) = record.subject_id() {
            self.by_subject
                .entry((record.subject_type().to_string(), subject_id.to_string()))
                .or_default()
                .push(row);
        }
        if let Some(address) = record.network_address() {
            self.by_address
                .entry(address.to_string())
                .or_default()
                .push(row);
        }

        self.rows.push(record);
        Ok(())
    }

    pub fn get(&self, id: AuditRecordId) -> Option<&AuditRecord> {
        self.by_id.get(&id).map(|&row| &self.rows[row])
    }

    pub fn distinct_actors(&self) -> Vec<UserId> {
        let mut actors: Vec<UserId> = self.by_actor.keys().copied().collect();
        actors.sort();
        actors
    }

    pub fn distinct_subject_types(&self) -> Vec<String> {
        self.by_subject_type.keys().cloned().collect()
    }

    pub fn distinct_actions(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.by_action.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Evaluate criteria and return the requested page, newest first
    pub fn query(&self, criteria: &Criteria, page: PageRequest) -> AuditResult<Page<AuditRecord>> {
        page.validate()?;
        if let (Some(from), Some(to)) = (criteria.created_from, criteria.created_to) {
            if from > to {
                return Err(AuditError::QueryValidation(format!(
                    "range start {} is after range end {}",
                    from, to
                )));
            }
        }

        let matched: Vec<usize> = match self.candidates(criteria) {
            Some(rows) => {
                let mut rows: Vec<usize> = rows
                    .iter()
                    .copied()
                    .filter(|&row| criteria.matches(&self.rows[row]))
                    .collect();
                rows.sort_by(|a, b| self.rows[*b].sort_key().cmp(&self.rows[*a].sort_key()));
                rows
            }
            // the time index is already ordered, so a reverse scan needs no sort
            None => self
                .by_time
                .range(time_bounds(criteria))
                .rev()
                .map(|(_, &row)| row)
                .filter(|&row| criteria.matches(&self.rows[row]))
                .collect(),
        };

        let items = matched
            .iter()
            .skip(page.offset())
            .take(page.per_page)
            .map(|&row| self.rows[row].clone())
            .collect();

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total: matched.len(),
        })
    }

    /// Smallest posting list among the equality predicates present
    fn candidates(&self, criteria: &Criteria) -> Option<Cow<'_, [usize]>> {
        let mut lists: Vec<Cow<'_, [usize]>> = Vec::new();

        if let Some(actor) = criteria.actor_id {
            lists.push(posting(self.by_actor.get(&actor)));
        }
        if let Some(action) = &criteria.action {
            lists.push(posting(self.by_action.get(action.code())));
        }
        if let Some(subject) = &criteria.subject {
            lists.push(posting(self.by_subject.get(subject)));
        }
        if let Some(address) = &criteria.network_address {
            lists.push(posting(self.by_address.get(address)));
        }
        if let Some(fragment) = &criteria.subject_type_contains {
            let union: Vec<usize> = self
                .by_subject_type
                .iter()
                .filter(|(tag, _)| tag.to_lowercase().contains(fragment.as_str()))
                .flat_map(|(_, rows)| rows.iter().copied())
                .collect();
            lists.push(Cow::Owned(union));
        }

        lists.into_iter().min_by_key(|list| list.len())
    }
}

fn posting(rows: Option<&Vec<usize>>) -> Cow<'_, [usize]> {
    match rows {
        Some(rows) => Cow::Borrowed(rows.as_slice()),
        None => Cow::Owned(Vec::new()),
    }
}

fn time_bounds(criteria: &Criteria) -> (Bound<TimeKey>, Bound<TimeKey>) {
    let lower = match criteria.created_from {
        Some(from) => Bound::Included((from, AuditRecordId::from_uuid(Uuid::nil()))),
        None => Bound::Unbounded,
    };
    let upper = match criteria.created_to {
        Some(to) => Bound::Included((to, AuditRecordId::from_uuid(Uuid::from_u128(u128::MAX)))),
        None => Bound::Unbounded,
    };
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::action::AuditAction;
    use crate::audit::context::{ContextResolver, RequestContext};
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn record(actor: Option<UserId>, action: AuditAction, subject: &str, minute: i64) -> AuditRecord {
        let ctx = match actor {
            Some(actor) => RequestContext::for_user(actor).with_network_address("10.1.1.1"),
            None => RequestContext::system(),
        };
        AuditRecord::draft(action, "models::JobPosting")
            .subject_id(subject)
            .context(&ContextResolver::resolve(&ctx))
            .build(at(minute))
    }

    fn populated(actor: UserId, other: UserId) -> AuditIndex {
        let mut index = AuditIndex::new();
        for minute in 0..30 {
            let who = if minute % 2 == 0 { actor } else { other };
            let action = if minute % 3 == 0 {
                AuditAction::Updated
            } else {
                AuditAction::Created
            };
            index
                .insert(record(Some(who), action, &format!("job-{}", minute % 4), minute))
                .unwrap();
        }
        index
    }

    #[test]
    fn test_duplicate_insert_is_persist_failure() {
        let mut index = AuditIndex::new();
        let rec = record(None, AuditAction::Created, "job-1", 0);
        index.insert(rec.clone()).unwrap();

        let err = index.insert(rec).unwrap_err();
        assert!(matches!(err, AuditError::Persist(_)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_unfiltered_query_is_newest_first() {
        let index = populated(UserId::new(), UserId::new());
        let page = index.query(&Criteria::new(), PageRequest::first(5)).unwrap();

        assert_eq!(page.total, 30);
        assert_eq!(page.items[0].created_at(), at(29));
        assert!(page
            .items
            .windows(2)
            .all(|w| w[0].sort_key() > w[1].sort_key()));
    }

    #[test]
    fn test_actor_and_action_filter_pages_do_not_overlap() {
        let actor = UserId::new();
        let index = populated(actor, UserId::new());
        let criteria = Criteria::new()
            .by_actor(actor)
            .by_action(AuditAction::Updated);

        let first = index.query(&criteria, PageRequest::new(1, 2)).unwrap();
        let second = index.query(&criteria, PageRequest::new(2, 2)).unwrap();

        // minutes 0, 6, 12, 18, 24 are both even and divisible by three
        assert_eq!(first.total, 5);
        for rec in first.items.iter().chain(second.items.iter()) {
            assert_eq!(rec.actor_id(), Some(actor));
            assert_eq!(rec.action(), &AuditAction::Updated);
        }

        let first_ids: HashSet<_> = first.items.iter().map(|r| r.id()).collect();
        assert!(second.items.iter().all(|r| !first_ids.contains(&r.id())));
        assert!(first.items[1].sort_key() > second.items[0].sort_key());
    }

    #[test]
    fn test_range_scan_is_inclusive() {
        let index = populated(UserId::new(), UserId::new());
        let criteria = Criteria::new().created_between(Some(at(10)), Some(at(12)));

        let page = index.query(&criteria, PageRequest::first(20)).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].created_at(), at(12));
        assert_eq!(page.items[2].created_at(), at(10));
    }

    #[test]
    fn test_subject_and_type_fragment() {
        let index = populated(UserId::new(), UserId::new());

        let history = index
            .query(
                &Criteria::new().for_subject("models::JobPosting", "job-1"),
                PageRequest::first(20),
            )
            .unwrap();
        assert!(history.items.iter().all(|r| r.subject_id() == Some("job-1")));
        assert!(history.total > 0);

        let none = index
            .query(&Criteria::new().subject_type_like("logbook"), PageRequest::first(20))
            .unwrap();
        assert_eq!(none.total, 0);

        let all = index
            .query(&Criteria::new().subject_type_like("posting"), PageRequest::first(50))
            .unwrap();
        assert_eq!(all.total, 30);
    }

    #[test]
    fn test_unknown_actor_yields_empty_page() {
        let index = populated(UserId::new(), UserId::new());
        let page = index
            .query(&Criteria::new().by_actor(UserId::new()), PageRequest::first(20))
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_distinct_values() {
        let actor = UserId::new();
        let other = UserId::new();
        let mut index = populated(actor, other);
        index
            .insert(record(None, AuditAction::Deleted, "job-9", 40))
            .unwrap();

        let mut expected = vec![actor, other];
        expected.sort();
        assert_eq!(index.distinct_actors(), expected);
        assert_eq!(index.distinct_subject_types(), vec!["models::JobPosting".to_string()]);
    }
}
