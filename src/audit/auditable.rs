//! The `Auditable` capability and the subject type registry
//!
//! Any domain type that wants a change trail implements [`Auditable`]. The
//! registry maps type tags to display labels and to per-type redaction.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{AuditError, AuditResult};

/// Flat map of field name to value describing an entity at one instant
pub type FieldMap = serde_json::Map<String, Value>;

/// Capability required for an entity to be tracked by the auditor
pub trait Auditable: Serialize {
    /// Polymorphic discriminator stored as `subject_type`
    const TYPE_TAG: &'static str;

    fn type_tag(&self) -> &'static str {
        Self::TYPE_TAG
    }

    /// Identifier stored as `subject_id`
    fn primary_key(&self) -> String;

    /// Current field values. The default serializes the entity with serde.
    fn snapshot(&self) -> AuditResult<FieldMap> {
        snapshot_of(self)
    }
}

/// Serialize a value into a field map, failing if it is not a JSON object
pub fn snapshot_of<T: Serialize + ?Sized>(value: &T) -> AuditResult<FieldMap> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(AuditError::Capture(format!(
            "snapshot must serialize to an object, got {}",
            value_kind(&other)
        ))),
        Err(e) => Err(AuditError::Capture(format!("snapshot is not serializable: {}", e))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Shortened display name for a subject type tag
///
/// `models::JobPosting`, `App\Models\Job` and `portal.job` all reduce to their
/// last segment.
pub fn short_type_name(tag: &str) -> &str {
    let tag = tag.trim();
    if tag.is_empty() {
        return "N/A";
    }
    let after_path = tag.rsplit("::").next().unwrap_or(tag);
    let after_backslash = after_path.rsplit('\\').next().unwrap_or(after_path);
    after_backslash.rsplit('.').next().unwrap_or(after_backslash)
}

/// Per-type audit configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeProfile {
    /// Display label overriding the shortened tag
    pub label: Option<String>,
    /// Sensitive fields redacted for this type in addition to the global set
    pub sensitive_fields: Vec<String>,
}

impl TypeProfile {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            sensitive_fields: Vec::new(),
        }
    }

    pub fn with_sensitive_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_fields.extend(fields.into_iter().map(Into::into));
        self
    }
}

/// Registry of auditable types keyed by type tag
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    profiles: BTreeMap<&'static str, TypeProfile>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concrete type with its profile, replacing any previous entry
    pub fn register<T: Auditable>(&mut self, profile: TypeProfile) -> &mut Self {
        self.profiles.insert(T::TYPE_TAG, profile);
        self
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.profiles.contains_key(tag)
    }

    pub fn profile(&self, tag: &str) -> Option<&TypeProfile> {
        self.profiles.get(tag)
    }

    /// Registered tags with their profiles, in tag order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &TypeProfile)> {
        self.profiles.iter().map(|(tag, profile)| (*tag, profile))
    }

    /// Display label for a tag, registered or not
    pub fn label_for(&self, tag: &str) -> String {
        self.profiles
            .get(tag)
            .and_then(|p| p.label.clone())
            .unwrap_or_else(|| short_type_name(tag).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Widget {
        id: u32,
        name: String,
    }

    impl Auditable for Widget {
        const TYPE_TAG: &'static str = "tests::Widget";

        fn primary_key(&self) -> String {
            self.id.to_string()
        }
    }

    #[derive(Serialize)]
    struct Bare(u32);

    #[test]
    fn test_default_snapshot_serializes_fields() {
        let widget = Widget {
            id: 7,
            name: "gear".into(),
        };
        let snapshot = widget.snapshot().unwrap();
        assert_eq!(snapshot.get("name"), Some(&json!("gear")));
        assert_eq!(widget.type_tag(), "tests::Widget");
        assert_eq!(widget.primary_key(), "7");
    }

    #[test]
    fn test_non_object_snapshot_is_capture_failure() {
        let err = snapshot_of(&Bare(3)).unwrap_err();
        assert!(matches!(err, AuditError::Capture(_)));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("models::JobPosting"), "JobPosting");
        assert_eq!(short_type_name("App\\Models\\Job"), "Job");
        assert_eq!(short_type_name("portal.logbook"), "logbook");
        assert_eq!(short_type_name("User"), "User");
        assert_eq!(short_type_name(""), "N/A");
    }

    #[test]
    fn test_registry_labels() {
        let mut registry = TypeRegistry::new();
        registry.register::<Widget>(TypeProfile::labelled("Gadget"));

        assert!(registry.is_registered("tests::Widget"));
        assert_eq!(registry.label_for("tests::Widget"), "Gadget");
        assert_eq!(registry.label_for("models::Unknown"), "Unknown");
    }
}
