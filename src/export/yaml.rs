//! YAML export of the audit trail

use std::io::Write;

use crate::audit::AuditView;
use crate::error::{AuditError, AuditResult};
use crate::export::json::AuditExport;

/// Write records as YAML, preceded by a short comment header
pub fn export_yaml<W: Write>(records: Vec<AuditView>, writer: &mut W) -> AuditResult<()> {
    let export = AuditExport::new(records);

    writeln!(writer, "# SINTESIS audit trail export")
        .and_then(|_| writeln!(writer, "# Generated: {}", export.exported_at))
        .and_then(|_| writeln!(writer, "# Records: {}", export.record_count))
        .and_then(|_| writeln!(writer))
        .map_err(|e| AuditError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| AuditError::Export(e.to_string()))
}
