//! Domain models of the internship portal
//!
//! Only the entities that act as audit subjects live here: job postings,
//! users and logbook entries.

pub mod ids;
pub mod job;
pub mod logbook;
pub mod user;

pub use ids::{AuditRecordId, JobId, LogbookId, UserId};
pub use job::{JobPosting, JobStatus, JobType};
pub use logbook::{Logbook, LogbookStatus};
pub use user::{User, UserRole, UserStatus};

use crate::audit::{TypeProfile, TypeRegistry};

/// Registry of every auditable model with its display label
pub fn default_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    registry
        .register::<JobPosting>(TypeProfile::labelled("Job Posting"))
        .register::<User>(User::audit_profile())
        .register::<Logbook>(TypeProfile::labelled("Logbook"));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Auditable;

    #[test]
    fn test_default_registry() {
        let registry = default_registry();
        assert!(registry.is_registered(JobPosting::TYPE_TAG));
        assert_eq!(registry.label_for(JobPosting::TYPE_TAG), "Job Posting");
        assert_eq!(
            registry.profile(User::TYPE_TAG).unwrap().sensitive_fields,
            vec!["national_id".to_string()]
        );
    }
}
