//! Redaction of sensitive snapshot fields
//!
//! Values are replaced, never removed, so a reader can still see that a
//! sensitive field was part of the change.

use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::auditable::FieldMap;

/// Marker written in place of a sensitive value
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// Replace every sensitive field present in the snapshot with the marker
///
/// Sensitive fields absent from the snapshot are skipped.
pub fn redact(mut snapshot: FieldMap, sensitive_fields: &BTreeSet<String>) -> FieldMap {
    for field in sensitive_fields {
        match snapshot.get_mut(field) {
            Some(value) => *value = Value::String(REDACTION_MARKER.to_string()),
            None => tracing::trace!(field = %field, "sensitive field absent from snapshot"),
        }
    }
    snapshot
}

/// Global sensitive-field set with per-type extensions
#[derive(Debug, Clone, Default)]
pub struct RedactionPolicy {
    global: BTreeSet<String>,
    per_type: BTreeMap<String, BTreeSet<String>>,
}

impl RedactionPolicy {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            global: fields.into_iter().map(Into::into).collect(),
            per_type: BTreeMap::new(),
        }
    }

    /// Add fields redacted only for the given subject type
    pub fn for_type<I, S>(&mut self, type_tag: &str, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.per_type
            .entry(type_tag.to_string())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
    }

    pub fn global_fields(&self) -> &BTreeSet<String> {
        &self.global
    }

    /// Effective field set for a subject type
    pub fn fields_for(&self, type_tag: &str) -> BTreeSet<String> {
        let mut fields = self.global.clone();
        if let Some(extra) = self.per_type.get(type_tag) {
            fields.extend(extra.iter().cloned());
        }
        fields
    }

    /// Redact an optional snapshot for a subject type
    pub fn apply(&self, type_tag: &str, snapshot: Option<FieldMap>) -> Option<FieldMap> {
        let fields = self.fields_for(type_tag);
        snapshot.map(|s| redact(s, &fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> FieldMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_redact_replaces_value_and_keeps_key() {
        let sensitive: BTreeSet<String> = ["password".to_string()].into_iter().collect();
        let snapshot = fields(json!({"email": "a@b.c", "password": "hunter2"}));

        let redacted = redact(snapshot, &sensitive);
        assert_eq!(redacted.get("password"), Some(&json!(REDACTION_MARKER)));
        assert_eq!(redacted.get("email"), Some(&json!("a@b.c")));
    }

    #[test]
    fn test_absent_field_is_skipped() {
        let sensitive: BTreeSet<String> = ["google_id".to_string()].into_iter().collect();
        let snapshot = fields(json!({"name": "Rina"}));

        let redacted = redact(snapshot.clone(), &sensitive);
        assert_eq!(redacted, snapshot);
        assert!(!redacted.contains_key("google_id"));
    }

    #[test]
    fn test_null_sensitive_value_is_still_masked() {
        let sensitive: BTreeSet<String> = ["remember_token".to_string()].into_iter().collect();
        let redacted = redact(fields(json!({"remember_token": null})), &sensitive);
        assert_eq!(redacted.get("remember_token"), Some(&json!(REDACTION_MARKER)));
    }

    #[test]
    fn test_policy_per_type_fields() {
        let mut policy = RedactionPolicy::new(["password"]);
        policy.for_type("models::User", ["national_id"]);

        let user = policy
            .apply(
                "models::User",
                Some(fields(json!({"password": "x", "national_id": "3171"}))),
            )
            .unwrap();
        assert_eq!(user.get("national_id"), Some(&json!(REDACTION_MARKER)));

        let other = policy
            .apply("models::Logbook", Some(fields(json!({"national_id": "3171"}))))
            .unwrap();
        assert_eq!(other.get("national_id"), Some(&json!("3171")));

        assert!(policy.apply("models::User", None).is_none());
    }
}
