//! Display formatting for terminal output
//!
//! Tables are rendered with `tabled` in the psql style; detail views are
//! plain aligned text.

pub mod audit;
pub mod portal;

pub use audit::{format_action_list, format_activity_feed, format_audit_details, format_audit_page};
pub use portal::{format_job_list, format_logbook_list, format_user_list};
