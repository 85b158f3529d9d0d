//! CSV export of the audit trail
//!
//! One row per record. Before/after states are collapsed into a one-line
//! change summary; use the JSON export for the full snapshots.

use std::io::Write;

use crate::audit::{summarize, AuditView};
use crate::error::{AuditError, AuditResult};

const HEADER: [&str; 12] = [
    "ID",
    "Created At",
    "Actor",
    "Actor Email",
    "Action",
    "Subject Type",
    "Subject ID",
    "Changes",
    "IP Address",
    "HTTP Verb",
    "Request Path",
    "User Agent",
];

/// Write records as CSV with a header row
pub fn export_csv<W: Write>(records: &[AuditView], writer: &mut W) -> AuditResult<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADER)
        .map_err(|e| AuditError::Export(e.to_string()))?;

    for view in records {
        let id = view.id.as_uuid().to_string();
        let contact = view.actor.as_ref().map(|a| a.contact.as_str()).unwrap_or("");
        let changes = summarize(&view.computed_diff).unwrap_or_default();

        out.write_record([
            id.as_str(),
            view.created_at_display.as_str(),
            view.actor_name(),
            contact,
            view.action_label.as_str(),
            view.subject_type_label.as_str(),
            view.subject_id.as_deref().unwrap_or(""),
            changes.as_str(),
            view.network_address.as_deref().unwrap_or(""),
            view.http_verb.as_deref().unwrap_or(""),
            view.request_path.as_deref().unwrap_or(""),
            view.user_agent.as_deref().unwrap_or(""),
        ])
        .map_err(|e| AuditError::Export(e.to_string()))?;
    }

    out.flush().map_err(|e| AuditError::Export(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only_for_empty_trail() {
        let mut out = Vec::new();
        export_csv(&[], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("ID,Created At,Actor,"));
    }
}
