//! Read-side query service
//!
//! Validates caller filters, compiles them into store [`Criteria`] and
//! projects stored records into display-ready [`AuditView`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::{ActionCatalog, ActionOption, AuditAction};
use super::auditable::{FieldMap, TypeRegistry};
use super::context::{Clock, SystemClock};
use super::diff::FieldDiff;
use super::record::AuditRecord;
use super::store::{AuditStore, Criteria, Page, PageRequest, SearchTerm};
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecordId, UserId};

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Name and contact of an actor, as shown next to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: UserId,
    pub name: String,
    pub contact: String,
}

/// Lookup of actor display data, implemented by the user store
pub trait ActorDirectory {
    fn lookup(&self, id: UserId) -> AuditResult<Option<ActorSummary>>;

    /// Actors whose name or contact contains the term, case-insensitively
    fn search(&self, term: &str) -> AuditResult<Vec<UserId>>;
}

/// Caller-facing filter set; every present filter must hold
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQuery {
    pub action: Option<String>,
    pub actor_id: Option<UserId>,
    pub subject_type: Option<String>,
    pub subject: Option<(String, String)>,
    pub network_address: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub search: Option<String>,
    /// 1-based; defaults to the first page
    pub page: Option<usize>,
}

impl AuditQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(mut self, code: impl Into<String>) -> Self {
        self.action = Some(code.into());
        self
    }

    pub fn actor(mut self, actor_id: UserId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    pub fn subject_type(mut self, fragment: impl Into<String>) -> Self {
        self.subject_type = Some(fragment.into());
        self
    }

    pub fn subject(mut self, subject_type: impl Into<String>, subject_id: impl Into<String>) -> Self {
        self.subject = Some((subject_type.into(), subject_id.into()));
        self
    }

    pub fn network_address(mut self, address: impl Into<String>) -> Self {
        self.network_address = Some(address.into());
        self
    }

    pub fn from(mut self, from: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self
    }

    pub fn to(mut self, to: DateTime<Utc>) -> Self {
        self.to = Some(to);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

/// Display projection of one audit record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditView {
    pub id: AuditRecordId,
    pub actor: Option<ActorSummary>,
    pub action: String,
    pub action_label: String,
    pub subject_type: String,
    pub subject_type_label: String,
    pub subject_id: Option<String>,
    pub before_state: Option<FieldMap>,
    pub after_state: Option<FieldMap>,
    pub metadata: Option<FieldMap>,
    pub computed_diff: FieldDiff,
    pub network_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_path: Option<String>,
    pub http_verb: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_at_display: String,
    pub created_at_relative: String,
}

impl AuditView {
    /// Actor name, or "System" when the record has no actor
    pub fn actor_name(&self) -> &str {
        self.actor.as_ref().map(|a| a.name.as_str()).unwrap_or("System")
    }
}

/// Compact entry of the recent-activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityItem {
    pub id: AuditRecordId,
    pub actor_name: String,
    pub action: String,
    pub action_label: String,
    pub subject_label: String,
    pub subject_id: Option<String>,
    pub created_at_relative: String,
}

/// A subject type tag with its display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectTypeOption {
    pub value: String,
    pub label: String,
}

/// Values available to populate filter controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub actors: Vec<ActorSummary>,
    pub subject_types: Vec<SubjectTypeOption>,
    pub actions: Vec<ActionOption>,
}

/// Query and projection over an audit store
pub struct QueryService<'a> {
    store: &'a dyn AuditStore,
    directory: &'a dyn ActorDirectory,
    catalog: &'a ActionCatalog,
    registry: &'a TypeRegistry,
    page_size: usize,
    clock: &'a dyn Clock,
}

impl<'a> QueryService<'a> {
    pub fn new(
        store: &'a dyn AuditStore,
        directory: &'a dyn ActorDirectory,
        catalog: &'a ActionCatalog,
        registry: &'a TypeRegistry,
    ) -> Self {
        Self {
            store,
            directory,
            catalog,
            registry,
            page_size: DEFAULT_PAGE_SIZE,
            clock: &SystemClock,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Filtered, paginated records, newest first
    pub fn search(&self, query: &AuditQuery) -> AuditResult<Page<AuditView>> {
        let (criteria, page) = self.compile(query)?;
        let records = self.store.query(&criteria, page)?;
        let now = self.clock.now();

        let mut views = Vec::with_capacity(records.items.len());
        for record in &records.items {
            views.push(self.view(record, now)?);
        }

        Ok(Page {
            items: views,
            page: records.page,
            per_page: records.per_page,
            total: records.total,
        })
    }

    /// A single record with full detail
    pub fn get(&self, id: AuditRecordId) -> AuditResult<AuditView> {
        let record = self
            .store
            .get(id)?
            .ok_or_else(|| AuditError::record_not_found(id.to_string()))?;
        self.view(&record, self.clock.now())
    }

    /// Trail of one subject, newest first
    pub fn history_for(
        &self,
        subject_type: &str,
        subject_id: &str,
        page: usize,
    ) -> AuditResult<Page<AuditView>> {
        self.search(&AuditQuery::new().subject(subject_type, subject_id).page(page))
    }

    /// Newest records in compact form
    pub fn recent_activity(&self, limit: usize) -> AuditResult<Vec<ActivityItem>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let records = self
            .store
            .query(&Criteria::new(), PageRequest::first(limit))?;
        let now = self.clock.now();

        records
            .items
            .iter()
            .map(|record| -> AuditResult<ActivityItem> {
                let actor_name = match record.actor_id() {
                    Some(id) => self
                        .directory
                        .lookup(id)?
                        .map(|a| a.name)
                        .unwrap_or_else(|| id.to_string()),
                    None => "System".to_string(),
                };
                Ok(ActivityItem {
                    id: record.id(),
                    actor_name,
                    action: record.action().code().to_string(),
                    action_label: self.catalog.label(record.action()),
                    subject_label: self.registry.label_for(record.subject_type()),
                    subject_id: record.subject_id().map(str::to_string),
                    created_at_relative: relative_time(now, record.created_at()),
                })
            })
            .collect()
    }

    /// All known action codes with labels
    pub fn available_actions(&self) -> Vec<ActionOption> {
        self.catalog.options()
    }

    /// Distinct actors and subject types present in the trail
    pub fn filter_options(&self) -> AuditResult<FilterOptions> {
        let mut actors = Vec::new();
        for id in self.store.distinct_actors()? {
            match self.directory.lookup(id)? {
                Some(actor) => actors.push(actor),
                None => tracing::debug!(actor = %id, "actor missing from directory"),
            }
        }
        actors.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        let subject_types = self
            .store
            .distinct_subject_types()?
            .into_iter()
            .map(|value| SubjectTypeOption {
                label: self.registry.label_for(&value),
                value,
            })
            .collect();

        let mut actions = self.available_actions();
        for code in self.store.distinct_actions()? {
            if !actions.iter().any(|option| option.code == code) {
                let label = self.catalog.label(&AuditAction::from_code(&code));
                actions.push(ActionOption { code, label });
            }
        }

        Ok(FilterOptions {
            actors,
            subject_types,
            actions,
        })
    }

    /// Catalogued codes, or extension codes already present in the trail
    fn resolve_action(&self, code: &str) -> AuditResult<AuditAction> {
        if let Some(action) = self.catalog.resolve(code) {
            return Ok(action);
        }
        let code = code.trim();
        if self.store.distinct_actions()?.iter().any(|known| known == code) {
            return Ok(AuditAction::from_code(code));
        }
        Err(AuditError::QueryValidation(format!("unknown action '{}'", code)))
    }

    /// Every matching record regardless of page, newest first
    pub fn collect_all(&self, query: &AuditQuery) -> AuditResult<Vec<AuditView>> {
        let mut query = query.clone();
        let mut page = 1;
        let mut views = Vec::new();

        loop {
            query.page = Some(page);
            let result = self.search(&query)?;
            let more = result.has_more();
            views.extend(result.items);
            if !more {
                break;
            }
            page += 1;
        }

        Ok(views)
    }

    /// Validate a query and translate it into store criteria
    pub fn compile(&self, query: &AuditQuery) -> AuditResult<(Criteria, PageRequest)> {
        let page = PageRequest::new(query.page.unwrap_or(1), self.page_size);
        page.validate()?;

        if let (Some(from), Some(to)) = (query.from, query.to) {
            if from > to {
                return Err(AuditError::QueryValidation(format!(
                    "'from' ({}) is after 'to' ({})",
                    from.format("%Y-%m-%d %H:%M:%S"),
                    to.format("%Y-%m-%d %H:%M:%S")
                )));
            }
        }

        let mut criteria = Criteria::new().created_between(query.from, query.to);

        if let Some(code) = non_empty(query.action.as_deref()) {
            criteria = criteria.by_action(self.resolve_action(code)?);
        }

        if let Some(actor) = query.actor_id {
            criteria = criteria.by_actor(actor);
        }

        if let Some(fragment) = non_empty(query.subject_type.as_deref()) {
            criteria = criteria.subject_type_like(fragment);
        }

        if let Some((subject_type, subject_id)) = &query.subject {
            criteria = criteria.for_subject(subject_type, subject_id);
        }

        if let Some(address) = non_empty(query.network_address.as_deref()) {
            criteria = criteria.from_address(address);
        }

        if let Some(term) = non_empty(query.search.as_deref()) {
            let actors = self.directory.search(term)?;
            criteria = criteria.matching(SearchTerm::new(term).with_actors(actors));
        }

        Ok((criteria, page))
    }

    fn view(&self, record: &AuditRecord, now: DateTime<Utc>) -> AuditResult<AuditView> {
        let actor = match record.actor_id() {
            Some(id) => self.directory.lookup(id)?,
            None => None,
        };

        Ok(AuditView {
            id: record.id(),
            actor,
            action: record.action().code().to_string(),
            action_label: self.catalog.label(record.action()),
            subject_type: record.subject_type().to_string(),
            subject_type_label: self.registry.label_for(record.subject_type()),
            subject_id: record.subject_id().map(str::to_string),
            before_state: record.before_state().cloned(),
            after_state: record.after_state().cloned(),
            metadata: record.metadata().cloned(),
            computed_diff: record.computed_diff(),
            network_address: record.network_address().map(str::to_string),
            user_agent: record.user_agent().map(str::to_string),
            request_path: record.request_path().map(str::to_string),
            http_verb: record.http_verb().map(str::to_string),
            created_at: record.created_at(),
            created_at_display: record.created_at().format("%Y-%m-%d %H:%M:%S").to_string(),
            created_at_relative: relative_time(now, record.created_at()),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Human-readable distance from `then` to `now`, e.g. "3 minutes ago"
pub fn relative_time(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let (amount, unit) = match seconds {
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 7 * 86_400 => (s / 86_400, "day"),
        s if s < 30 * 86_400 => (s / (7 * 86_400), "week"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };

    if amount == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", amount, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::action::AuditAction;
    use crate::audit::context::{ContextResolver, RequestContext};
    use crate::audit::store::MemoryAuditStore;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    struct Directory(HashMap<UserId, ActorSummary>);

    impl ActorDirectory for Directory {
        fn lookup(&self, id: UserId) -> AuditResult<Option<ActorSummary>> {
            Ok(self.0.get(&id).cloned())
        }

        fn search(&self, term: &str) -> AuditResult<Vec<UserId>> {
            let term = term.to_lowercase();
            Ok(self
                .0
                .values()
                .filter(|a| a.name.to_lowercase().contains(&term) || a.contact.contains(&term))
                .map(|a| a.id)
                .collect())
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
    }

    struct Fixture {
        store: MemoryAuditStore,
        directory: Directory,
        catalog: ActionCatalog,
        registry: TypeRegistry,
        admin: UserId,
        mentor: UserId,
    }

    impl Fixture {
        fn new() -> Self {
            let admin = UserId::new();
            let mentor = UserId::new();
            let mut actors = HashMap::new();
            actors.insert(
                admin,
                ActorSummary {
                    id: admin,
                    name: "Rina Admin".into(),
                    contact: "rina@portal.id".into(),
                },
            );
            actors.insert(
                mentor,
                ActorSummary {
                    id: mentor,
                    name: "Bima Mentor".into(),
                    contact: "bima@portal.id".into(),
                },
            );

            let store = MemoryAuditStore::new();
            for minute in 0..25 {
                let (actor, address) = if minute % 5 == 0 {
                    (mentor, "10.0.0.2")
                } else {
                    (admin, "10.0.0.1")
                };
                let ctx = ContextResolver::resolve(
                    &RequestContext::for_user(actor)
                        .with_network_address(address)
                        .with_request("PUT", format!("/admin/jobs/{}", minute)),
                );
                let record = AuditRecord::draft(AuditAction::Updated, "models::JobPosting")
                    .subject_id(format!("job-{}", minute % 3))
                    .context(&ctx)
                    .build(base() + Duration::minutes(minute));
                store.append(record).unwrap();
            }

            let system = AuditRecord::draft(AuditAction::Created, "models::Logbook")
                .subject_id("lgb-1")
                .build(base() + Duration::minutes(30));
            store.append(system).unwrap();

            Self {
                store,
                directory: Directory(actors),
                catalog: ActionCatalog::default(),
                registry: TypeRegistry::new(),
                admin,
                mentor,
            }
        }

        fn service(&self) -> QueryService<'_> {
            QueryService::new(&self.store, &self.directory, &self.catalog, &self.registry)
        }
    }

    #[test]
    fn test_default_page_is_newest_first() {
        let fixture = Fixture::new();
        let page = fixture.service().search(&AuditQuery::new()).unwrap();

        assert_eq!(page.total, 26);
        assert_eq!(page.items.len(), DEFAULT_PAGE_SIZE);
        assert_eq!(page.items[0].subject_type_label, "Logbook");
        assert_eq!(page.items[0].actor_name(), "System");
        assert_eq!(page.last_page(), 2);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let fixture = Fixture::new();
        let err = fixture
            .service()
            .search(&AuditQuery::new().action("frobbed"))
            .unwrap_err();
        assert!(err.is_query_validation());
    }

    #[test]
    fn test_recorded_extension_action_is_filterable() {
        let fixture = Fixture::new();
        let record = AuditRecord::draft(AuditAction::Custom("certificate_issued".into()), "models::User")
            .subject_id("usr-7")
            .build(base() + Duration::minutes(40));
        fixture.store.append(record).unwrap();
        let service = fixture.service();

        let page = service
            .search(&AuditQuery::new().action("certificate_issued"))
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].action, "certificate_issued");

        let options = service.filter_options().unwrap();
        assert!(options.actions.iter().any(|o| o.code == "certificate_issued"));
        assert!(!service.available_actions().iter().any(|o| o.code == "certificate_issued"));

        assert!(service
            .search(&AuditQuery::new().action("frobbed"))
            .unwrap_err()
            .is_query_validation());
    }

    #[test]
    fn test_inverted_range_and_page_zero_are_rejected() {
        let fixture = Fixture::new();
        let service = fixture.service();

        let inverted = AuditQuery::new().from(base() + Duration::hours(1)).to(base());
        assert!(service.search(&inverted).unwrap_err().is_query_validation());
        assert!(service
            .search(&AuditQuery::new().page(0))
            .unwrap_err()
            .is_query_validation());
    }

    #[test]
    fn test_actor_filter_and_view_fields() {
        let fixture = Fixture::new();
        let page = fixture
            .service()
            .search(&AuditQuery::new().actor(fixture.mentor).action("updated"))
            .unwrap();

        assert_eq!(page.total, 5);
        let first = &page.items[0];
        assert_eq!(first.actor.as_ref().unwrap().name, "Bima Mentor");
        assert_eq!(first.action_label, "Updated");
        assert_eq!(first.subject_type_label, "JobPosting");
        assert_eq!(first.http_verb.as_deref(), Some("PUT"));
        assert_eq!(first.created_at_display, "2026-05-04 10:20:00");
    }

    #[test]
    fn test_free_text_search_covers_actor_name_and_address() {
        let fixture = Fixture::new();
        let service = fixture.service();

        let by_name = service.search(&AuditQuery::new().search("bima")).unwrap();
        assert_eq!(by_name.total, 5);

        let by_address = service.search(&AuditQuery::new().search("10.0.0.1")).unwrap();
        assert_eq!(by_address.total, 20);

        let by_path = service.search(&AuditQuery::new().search("/admin/jobs/24")).unwrap();
        assert_eq!(by_path.total, 1);
    }

    #[test]
    fn test_history_for_subject() {
        let fixture = Fixture::new();
        let history = fixture
            .service()
            .history_for("models::JobPosting", "job-0", 1)
            .unwrap();

        // minutes 0, 3, ..., 24
        assert_eq!(history.total, 9);
        assert!(history.items.iter().all(|v| v.subject_id.as_deref() == Some("job-0")));
    }

    #[test]
    fn test_get_missing_record() {
        let fixture = Fixture::new();
        let err = fixture.service().get(AuditRecordId::new()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_recent_activity() {
        let fixture = Fixture::new();
        let clock = FixedClock(base() + Duration::minutes(33));
        let items = fixture.service().with_clock(&clock).recent_activity(8).unwrap();

        assert_eq!(items.len(), 8);
        assert_eq!(items[0].actor_name, "System");
        assert_eq!(items[0].created_at_relative, "3 minutes ago");
        assert_eq!(items[1].actor_name, "Rina Admin");
    }

    #[test]
    fn test_filter_options() {
        let fixture = Fixture::new();
        let options = fixture.service().filter_options().unwrap();

        let names: Vec<_> = options.actors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Bima Mentor", "Rina Admin"]);
        assert_eq!(options.subject_types.len(), 2);
        assert_eq!(options.subject_types[0].label, "JobPosting");
        assert_eq!(options.actors[1].id, fixture.admin);
        assert_eq!(options.actions[0].code, "created");
    }

    #[test]
    fn test_collect_all_walks_every_page() {
        let fixture = Fixture::new();
        let service = fixture.service().with_page_size(7);
        let all = service.collect_all(&AuditQuery::new()).unwrap();
        assert_eq!(all.len(), 26);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn test_relative_time() {
        let now = base();
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(now, now - Duration::minutes(1)), "1 minute ago");
        assert_eq!(relative_time(now, now - Duration::hours(5)), "5 hours ago");
        assert_eq!(relative_time(now, now - Duration::days(2)), "2 days ago");
        assert_eq!(relative_time(now, now - Duration::days(14)), "2 weeks ago");
        assert_eq!(relative_time(now, now - Duration::days(400)), "1 year ago");
    }
}
