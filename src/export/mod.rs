//! Export of the audit trail
//!
//! A filtered slice of the trail can leave the system in three formats:
//! - JSON: machine-readable, wrapped in a document carrying the schema version
//! - CSV: one row per record for spreadsheets
//! - YAML: human-readable
//!
//! Every export is itself recorded in the trail.

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_csv;
pub use json::{export_json, AuditExport, EXPORT_SCHEMA_VERSION};
pub use yaml::export_yaml;

use serde_json::Value;
use std::fmt;
use std::io::Write;

use crate::audit::{AuditQuery, Auditor, FieldMap, QueryService, RequestContext};
use crate::error::AuditResult;

/// Subject type recorded on `export` events for the trail itself
pub const AUDIT_TRAIL_TYPE: &str = "audit::AuditRecord";

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Yaml,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Write every record matching `query`, then record the export
///
/// Returns the number of records written.
pub fn export_trail<W: Write>(
    queries: &QueryService<'_>,
    query: &AuditQuery,
    format: ExportFormat,
    writer: &mut W,
    auditor: &Auditor,
    ctx: &RequestContext,
) -> AuditResult<usize> {
    let records = queries.collect_all(query)?;
    let count = records.len();

    match format {
        ExportFormat::Json => export_json(records, writer)?,
        ExportFormat::Csv => export_csv(&records, writer)?,
        ExportFormat::Yaml => export_yaml(records, writer)?,
    }

    auditor.data_exported(AUDIT_TRAIL_TYPE, Some(export_metadata(query, format, count)), ctx);

    Ok(count)
}

fn export_metadata(query: &AuditQuery, format: ExportFormat, count: usize) -> FieldMap {
    let mut filters = FieldMap::new();
    if let Some(action) = &query.action {
        filters.insert("action".into(), Value::from(action.as_str()));
    }
    if let Some(actor) = query.actor_id {
        filters.insert("actor_id".into(), Value::from(actor.as_uuid().to_string()));
    }
    if let Some(subject_type) = &query.subject_type {
        filters.insert("subject_type".into(), Value::from(subject_type.as_str()));
    }
    if let Some(from) = query.from {
        filters.insert("from".into(), Value::from(from.to_rfc3339()));
    }
    if let Some(to) = query.to {
        filters.insert("to".into(), Value::from(to.to_rfc3339()));
    }
    if let Some(search) = &query.search {
        filters.insert("search".into(), Value::from(search.as_str()));
    }

    let mut metadata = FieldMap::new();
    metadata.insert("format".into(), Value::from(format.extension()));
    metadata.insert("record_count".into(), Value::from(count));
    if !filters.is_empty() {
        metadata.insert("filters".into(), Value::Object(filters));
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{
        ActionCatalog, ActorDirectory, ActorSummary, AuditAction, AuditStore, Criteria,
        MemoryAuditStore, PageRequest, TypeRegistry,
    };
    use crate::models::{JobPosting, JobType, UserId};
    use std::sync::Arc;

    struct NoActors;

    impl ActorDirectory for NoActors {
        fn lookup(&self, _id: UserId) -> AuditResult<Option<ActorSummary>> {
            Ok(None)
        }

        fn search(&self, _term: &str) -> AuditResult<Vec<UserId>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(ExportFormat::parse("CSV"), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("yml"), Some(ExportFormat::Yaml));
        assert_eq!(ExportFormat::parse("xml"), None);
    }

    #[test]
    fn test_export_is_recorded() {
        let store = Arc::new(MemoryAuditStore::new());
        let auditor = Auditor::new(store.clone());
        let admin = UserId::new();
        let ctx = RequestContext::for_user(admin);

        let job = JobPosting::new("Backend Intern", JobType::Remote, "Jakarta");
        auditor.on_create(&job, &ctx);

        let catalog = ActionCatalog::new(Default::default());
        let registry = TypeRegistry::new();
        let queries = QueryService::new(store.as_ref(), &NoActors, &catalog, &registry);

        let mut out = Vec::new();
        let query = AuditQuery::new().action("created");
        let count = export_trail(&queries, &query, ExportFormat::Json, &mut out, &auditor, &ctx).unwrap();
        assert_eq!(count, 1);

        let exports = store
            .query(&Criteria::new().by_action(AuditAction::Export), PageRequest::first(10))
            .unwrap();
        assert_eq!(exports.total, 1);
        let record = &exports.items[0];
        assert_eq!(record.subject_type(), AUDIT_TRAIL_TYPE);
        assert_eq!(record.actor_id(), Some(admin));
        let metadata = record.metadata().unwrap();
        assert_eq!(metadata["format"], "json");
        assert_eq!(metadata["record_count"], 1);
        assert_eq!(metadata["filters"]["action"], "created");
    }
}
