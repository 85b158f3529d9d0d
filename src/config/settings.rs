//! Audit trail settings
//!
//! Holds the redaction set, the update noise set, pagination and the
//! extension action catalogue. Persisted as `config.json` next to the log.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::paths::AuditPaths;
use crate::error::AuditError;

/// Settings for the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Fields whose values are replaced by the redaction marker
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,

    /// Fields that never trigger an update record on their own
    #[serde(default = "default_noise_fields")]
    pub noise_fields: Vec<String>,

    /// Fixed page size for audit queries
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Number of entries in the recent activity feed
    #[serde(default = "default_recent_activity_limit")]
    pub recent_activity_limit: usize,

    /// Extension action codes and their labels
    #[serde(default)]
    pub custom_actions: BTreeMap<String, String>,

    /// Whether explicit system-actor invocations are recorded
    #[serde(default = "default_record_system_actor")]
    pub record_system_actor: bool,
}

fn default_schema_version() -> u32 {
    1
}

fn default_sensitive_fields() -> Vec<String> {
    vec![
        "password".to_string(),
        "remember_token".to_string(),
        "google_id".to_string(),
    ]
}

fn default_noise_fields() -> Vec<String> {
    vec!["updated_at".to_string()]
}

fn default_page_size() -> usize {
    20
}

fn default_recent_activity_limit() -> usize {
    8
}

fn default_record_system_actor() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            sensitive_fields: default_sensitive_fields(),
            noise_fields: default_noise_fields(),
            page_size: default_page_size(),
            recent_activity_limit: default_recent_activity_limit(),
            custom_actions: BTreeMap::new(),
            record_system_actor: default_record_system_actor(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or use defaults if the file doesn't exist
    pub fn load_or_create(paths: &AuditPaths) -> Result<Self, AuditError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| AuditError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents)
                .map_err(|e| AuditError::Config(format!("Failed to parse settings file: {}", e)))?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &AuditPaths) -> Result<(), AuditError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| AuditError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| AuditError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Reject settings the query layer cannot work with
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.page_size == 0 {
            return Err(AuditError::Config("page_size must be at least 1".into()));
        }
        for code in self.custom_actions.keys() {
            if code.trim().is_empty() {
                return Err(AuditError::Config("custom action codes cannot be empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, 20);
        assert_eq!(settings.recent_activity_limit, 8);
        assert!(settings.sensitive_fields.contains(&"password".to_string()));
        assert_eq!(settings.noise_fields, vec!["updated_at".to_string()]);
        assert!(settings.record_system_actor);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.page_size = 50;
        settings
            .custom_actions
            .insert("certificate_issued".into(), "Certificate Issued".into());

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.page_size, 50);
        assert_eq!(
            loaded.custom_actions.get("certificate_issued").map(String::as_str),
            Some("Certificate Issued")
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"page_size": 5}"#).unwrap();
        assert_eq!(settings.page_size, 5);
        assert_eq!(settings.sensitive_fields.len(), 3);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = AuditPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), r#"{"page_size": 0}"#).unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, AuditError::Config(_)));
    }
}
