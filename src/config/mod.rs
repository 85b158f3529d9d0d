//! Configuration module
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - Audit settings persistence (redaction set, noise set, paging)

pub mod paths;
pub mod settings;

pub use paths::AuditPaths;
pub use settings::Settings;
