//! Audit action codes
//!
//! The closed set of built-in actions plus configuration-declared extension
//! codes. Actions serialize as their lowercase code (`created`, `login_failed`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What happened to the subject of an audit record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Restored,
    Login,
    Logout,
    LoginFailed,
    Registered,
    PasswordReset,
    Export,
    Import,
    /// Extension tag, e.g. `certificate_issued`
    Custom(String),
}

impl AuditAction {
    /// Built-in actions in catalogue order
    pub const BUILTIN: &'static [AuditAction] = &[
        AuditAction::Created,
        AuditAction::Updated,
        AuditAction::Deleted,
        AuditAction::Restored,
        AuditAction::Login,
        AuditAction::Logout,
        AuditAction::LoginFailed,
        AuditAction::Registered,
        AuditAction::PasswordReset,
        AuditAction::Export,
        AuditAction::Import,
    ];

    /// Stable storage code
    pub fn code(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Restored => "restored",
            Self::Login => "login",
            Self::Logout => "logout",
            Self::LoginFailed => "login_failed",
            Self::Registered => "registered",
            Self::PasswordReset => "password_reset",
            Self::Export => "export",
            Self::Import => "import",
            Self::Custom(code) => code,
        }
    }

    /// Human-readable label
    pub fn label(&self) -> String {
        match self {
            Self::Created => "Created".to_string(),
            Self::Updated => "Updated".to_string(),
            Self::Deleted => "Deleted".to_string(),
            Self::Restored => "Restored".to_string(),
            Self::Login => "Login".to_string(),
            Self::Logout => "Logout".to_string(),
            Self::LoginFailed => "Login Failed".to_string(),
            Self::Registered => "Registered".to_string(),
            Self::PasswordReset => "Password Reset".to_string(),
            Self::Export => "Data Export".to_string(),
            Self::Import => "Data Import".to_string(),
            Self::Custom(code) => capitalize(code),
        }
    }

    /// Look up a built-in action by code
    pub fn builtin(code: &str) -> Option<Self> {
        Self::BUILTIN.iter().find(|a| a.code() == code).cloned()
    }

    /// Convert a stored code back into an action, keeping unknown codes as custom
    pub fn from_code(code: &str) -> Self {
        Self::builtin(code).unwrap_or_else(|| Self::Custom(code.to_string()))
    }

    /// True for the entity lifecycle actions produced by the diff pipeline
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Updated | Self::Deleted | Self::Restored
        )
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<String> for AuditAction {
    fn from(code: String) -> Self {
        Self::builtin(&code).unwrap_or(Self::Custom(code))
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        action.code().to_string()
    }
}

/// Uppercase the first character, as a fallback label for unknown codes
fn capitalize(code: &str) -> String {
    let mut chars = code.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One entry of the action list used to build filter controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOption {
    pub code: String,
    pub label: String,
}

/// Built-in actions plus the extension codes declared in settings
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    custom: BTreeMap<String, String>,
}

impl ActionCatalog {
    pub fn new(custom: BTreeMap<String, String>) -> Self {
        Self { custom }
    }

    /// Resolve a code the caller may filter on; unknown codes yield None
    pub fn resolve(&self, code: &str) -> Option<AuditAction> {
        let code = code.trim();
        AuditAction::builtin(code).or_else(|| {
            self.custom
                .contains_key(code)
                .then(|| AuditAction::Custom(code.to_string()))
        })
    }

    /// Label for an action, preferring the configured label for extension codes
    pub fn label(&self, action: &AuditAction) -> String {
        match action {
            AuditAction::Custom(code) => self
                .custom
                .get(code)
                .cloned()
                .unwrap_or_else(|| action.label()),
            _ => action.label(),
        }
    }

    /// All known actions with labels, built-ins first
    pub fn options(&self) -> Vec<ActionOption> {
        AuditAction::BUILTIN
            .iter()
            .map(|a| ActionOption {
                code: a.code().to_string(),
                label: a.label(),
            })
            .chain(self.custom.iter().map(|(code, label)| ActionOption {
                code: code.clone(),
                label: label.clone(),
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_strings() {
        for action in AuditAction::BUILTIN {
            assert_eq!(AuditAction::from_code(action.code()), *action);
        }
        assert_eq!(
            AuditAction::from_code("certificate_issued"),
            AuditAction::Custom("certificate_issued".into())
        );
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&AuditAction::LoginFailed).unwrap();
        assert_eq!(json, "\"login_failed\"");
        let parsed: AuditAction = serde_json::from_str("\"export\"").unwrap();
        assert_eq!(parsed, AuditAction::Export);
    }

    #[test]
    fn test_labels() {
        assert_eq!(AuditAction::LoginFailed.label(), "Login Failed");
        assert_eq!(AuditAction::Export.label(), "Data Export");
        assert_eq!(AuditAction::Custom("archived".into()).label(), "Archived");
    }

    #[test]
    fn test_catalog_rejects_unknown_codes() {
        let catalog = ActionCatalog::default();
        assert_eq!(catalog.resolve("updated"), Some(AuditAction::Updated));
        assert_eq!(catalog.resolve("frobbed"), None);
    }

    #[test]
    fn test_catalog_custom_actions() {
        let mut custom = BTreeMap::new();
        custom.insert("certificate_issued".to_string(), "Certificate Issued".to_string());
        let catalog = ActionCatalog::new(custom);

        let action = catalog.resolve("certificate_issued").unwrap();
        assert!(action.is_custom());
        assert_eq!(catalog.label(&action), "Certificate Issued");

        let options = catalog.options();
        assert_eq!(options.len(), AuditAction::BUILTIN.len() + 1);
        assert_eq!(options[0].code, "created");
        assert_eq!(options.last().unwrap().label, "Certificate Issued");
    }
}
