//! Custom error types for the audit trail
//!
//! This module defines the error hierarchy for the crate using thiserror.
//! Write-path errors (`Capture`, `Persist`) never escape the auditor; they are
//! settled at a single boundary. Read-path errors propagate normally.

use thiserror::Error;

/// The main error type for audit trail operations
#[derive(Error, Debug)]
pub enum AuditError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for domain models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("Duplicate {entity_type}: {identifier}")]
    Duplicate {
        entity_type: &'static str,
        identifier: String,
    },

    /// Snapshot, diff or redaction could not be computed
    #[error("Capture failure: {0}")]
    Capture(String),

    /// The audit store rejected a write
    #[error("Persist failure: {0}")]
    Persist(String),

    /// Caller supplied malformed query parameters
    #[error("Invalid query: {0}")]
    QueryValidation(String),

    /// Repository errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl AuditError {
    /// Create a "not found" error for job postings
    pub fn job_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Job posting",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for users
    pub fn user_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "User",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for logbook entries
    pub fn logbook_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Logbook entry",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for audit records
    pub fn record_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Audit record",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a query validation error
    pub fn is_query_validation(&self) -> bool {
        matches!(self, Self::QueryValidation(_))
    }
}

impl From<std::io::Error> for AuditError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for audit trail operations
pub type AuditResult<T> = Result<T, AuditError>;
