//! sintesis-audit - entity change-tracking for the SINTESIS internship portal
//!
//! Every committed mutation of a job posting, user account or logbook entry,
//! plus authentication events, becomes an immutable audit record that
//! administrators can filter, page through and export.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `audit`: the audit engine (interceptor, diff, redaction, store, queries)
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Auditable portal entities
//! - `storage`: JSON file storage for the portal entities
//! - `services`: Business operations that commit and then audit
//! - `crypto`: Password hashing
//! - `export`: JSON, CSV and YAML export of the trail
//! - `cli` and `display`: the command-line surface
//!
//! # Example
//!
//! ```rust,ignore
//! use sintesis_audit::audit::{Auditor, JsonlAuditStore, RequestContext};
//! use sintesis_audit::config::{AuditPaths, Settings};
//!
//! let paths = AuditPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let store = Arc::new(JsonlAuditStore::open(paths.audit_log())?);
//! let auditor = Auditor::from_settings(store, &settings).with_registry(default_registry());
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{AuditError, AuditResult};
