//! Field-level diffing for audit records
//!
//! Compares two snapshots key by key and renders human-readable summaries
//! of the result for terminal output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::auditable::FieldMap;

/// Old and new value of one changed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

/// Changed fields keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldDiff(BTreeMap<String, FieldChange>);

impl FieldDiff {
    /// False when nothing changed (or only excluded fields did)
    pub fn is_material(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldChange> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldChange)> {
        self.0.iter()
    }

    /// Split into the changed fields' old values and new values
    pub fn into_states(self) -> (FieldMap, FieldMap) {
        let mut before = FieldMap::new();
        let mut after = FieldMap::new();
        for (field, change) in self.0 {
            before.insert(field.clone(), change.old);
            after.insert(field, change.new);
        }
        (before, after)
    }
}

/// Compare two snapshots
///
/// Keys missing on one side count as `null`. Values are compared
/// structurally, so equal arrays or objects produce no entry. Keys in
/// `excluded` never appear in the result.
pub fn diff(old: &FieldMap, new: &FieldMap, excluded: &BTreeSet<String>) -> FieldDiff {
    let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

    let changes = keys
        .into_iter()
        .filter(|key| !excluded.contains(*key))
        .filter_map(|key| {
            let old_value = old.get(key).cloned().unwrap_or(Value::Null);
            let new_value = new.get(key).cloned().unwrap_or(Value::Null);
            (old_value != new_value).then(|| {
                (
                    key.clone(),
                    FieldChange {
                        old: old_value,
                        new: new_value,
                    },
                )
            })
        })
        .collect();

    FieldDiff(changes)
}

/// Generate a one-line summary of a diff
///
/// Returns None when nothing changed.
pub fn summarize(changes: &FieldDiff) -> Option<String> {
    if changes.is_empty() {
        return None;
    }

    let parts: Vec<String> = changes
        .iter()
        .map(|(field, change)| match (&change.old, &change.new) {
            (Value::Null, new) => format!("{}: (added) -> {}", field, format_value(new)),
            (old, Value::Null) => format!("{}: {} -> (removed)", field, format_value(old)),
            (old, new) => format!("{}: {} -> {}", field, format_value(old), format_value(new)),
        })
        .collect();

    Some(parts.join(", "))
}

/// Format a JSON value for human-readable display
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().count() > 50 {
                let truncated: String = s.chars().take(47).collect();
                format!("\"{}...\"", truncated)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
