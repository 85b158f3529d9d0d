//! Service layer for the portal
//!
//! Every mutation goes through a service: validate, commit to the
//! repository, then hand the committed entity to the [`Auditor`]. The audit
//! call never changes the outcome returned to the caller.
//!
//! [`Auditor`]: crate::audit::Auditor

pub mod auth;
pub mod job;
pub mod logbook;
pub mod user;

pub use auth::{AuthService, LoginOutcome};
pub use job::{JobChanges, JobInput, JobService};
pub use logbook::{LogbookChanges, LogbookService};
pub use user::{UserChanges, UserInput, UserService};
