//! Entity change-tracking for the internship portal
//!
//! Records every committed mutation of an auditable entity, plus security
//! events, as an immutable trail that administrators can filter and page.
//!
//! # Architecture
//!
//! - [`Auditable`]: capability implemented by tracked domain types.
//! - [`Auditor`]: lifecycle interceptor. Computes the field diff, redacts
//!   sensitive values, attaches request context and appends the record.
//!   Audit failures never reach the business caller.
//! - [`AuditStore`]: append-only persistence, in memory or as a JSONL file.
//! - [`QueryService`]: filtering, pagination and display projection.
//!
//! # Example
//!
//! ```rust,ignore
//! use sintesis_audit::audit::{Auditor, MemoryAuditStore, RequestContext};
//!
//! let auditor = Auditor::new(Arc::new(MemoryAuditStore::new()));
//! let ctx = RequestContext::for_user(admin_id).with_network_address("10.0.0.1");
//!
//! let original = job.snapshot()?;
//! job.title = "Backend Developer Intern".into();
//! repository.upsert(job.clone())?;
//! repository.save()?;
//! auditor.on_update(&job, &original, &ctx);
//! ```

mod action;
mod auditable;
mod context;
mod diff;
mod interceptor;
mod query;
mod record;
mod redaction;
mod store;

pub use action::{ActionCatalog, ActionOption, AuditAction};
pub use auditable::{short_type_name, snapshot_of, Auditable, FieldMap, TypeProfile, TypeRegistry};
pub use context::{
    Clock, ContextResolver, Principal, RequestContext, Resolution, ResolvedContext,
    SteppingClock, SystemClock,
};
pub use diff::{diff, format_value, summarize, FieldChange, FieldDiff};
pub use interceptor::{AuditHealth, Auditor, HealthSnapshot};
pub use query::{
    relative_time, ActivityItem, ActorDirectory, ActorSummary, AuditQuery, AuditView,
    FilterOptions, QueryService, SubjectTypeOption, DEFAULT_PAGE_SIZE,
};
pub use record::{AuditRecord, RecordDraft};
pub use redaction::{redact, RedactionPolicy, REDACTION_MARKER};
pub use store::{
    AuditIndex, AuditStore, Criteria, JsonlAuditStore, MemoryAuditStore, Page, PageRequest,
    SearchTerm,
};
