//! JSON export of the audit trail

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::audit::AuditView;
use crate::error::{AuditError, AuditResult};

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Document written around exported records
#[derive(Debug, Clone, Serialize)]
pub struct AuditExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub record_count: usize,

    /// Records, newest first
    pub records: Vec<AuditView>,
}

impl AuditExport {
    pub fn new(records: Vec<AuditView>) -> Self {
        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            record_count: records.len(),
            records,
        }
    }
}

/// Write records as a pretty-printed JSON document
pub fn export_json<W: Write>(records: Vec<AuditView>, writer: &mut W) -> AuditResult<()> {
    let export = AuditExport::new(records);
    serde_json::to_writer_pretty(&mut *writer, &export)
        .map_err(|e| AuditError::Export(e.to_string()))?;
    writeln!(writer).map_err(|e| AuditError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_export_document() {
        let mut out = Vec::new();
        export_json(Vec::new(), &mut out).unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(doc["schema_version"], EXPORT_SCHEMA_VERSION);
        assert_eq!(doc["record_count"], 0);
        assert!(doc["records"].as_array().unwrap().is_empty());
    }
}
