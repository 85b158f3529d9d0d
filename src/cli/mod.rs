//! CLI command handlers
//!
//! This module bridges clap argument parsing with the service layer. Every
//! handler receives a [`Session`] describing who is acting and from where,
//! and builds the per-command [`RequestContext`] from it.

pub mod audit;
pub mod auth;
pub mod job;
pub mod logbook;
pub mod user;

pub use audit::{handle_audit_command, AuditCommands};
pub use auth::{handle_auth_command, AuthCommands};
pub use job::{handle_job_command, JobCommands};
pub use logbook::{handle_logbook_command, LogbookCommands};
pub use user::{handle_user_command, UserCommands};

use chrono::NaiveDate;

use crate::audit::{ActionCatalog, Auditor, Principal, QueryService, RequestContext};
use crate::config::Settings;
use crate::error::{AuditError, AuditResult};
use crate::models::UserId;
use crate::services::UserService;
use crate::storage::Storage;

/// Everything a command handler needs besides its own arguments
pub struct Session<'a> {
    pub storage: &'a Storage,
    pub auditor: &'a Auditor,
    pub settings: &'a Settings,
    pub catalog: &'a ActionCatalog,
    principal: Option<Principal>,
    network_address: Option<String>,
    user_agent: Option<String>,
}

impl<'a> Session<'a> {
    pub fn new(
        storage: &'a Storage,
        auditor: &'a Auditor,
        settings: &'a Settings,
        catalog: &'a ActionCatalog,
    ) -> Self {
        Self {
            storage,
            auditor,
            settings,
            catalog,
            principal: None,
            network_address: None,
            user_agent: None,
        }
    }

    pub fn with_principal(mut self, principal: Option<Principal>) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_network_address(mut self, address: Option<String>) -> Self {
        self.network_address = address;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Request context for one command, as if it were `verb path`
    pub fn context(&self, verb: &str, path: impl Into<String>) -> RequestContext {
        let mut ctx = RequestContext::none().with_request(verb, path);
        if let Some(principal) = self.principal {
            ctx = ctx.with_principal(principal);
        }
        if let Some(address) = &self.network_address {
            ctx = ctx.with_network_address(address.clone());
        }
        if let Some(agent) = &self.user_agent {
            ctx = ctx.with_user_agent(agent.clone());
        }
        ctx
    }

    /// The signed-in user, required by commands acting on their own behalf
    pub fn acting_user(&self) -> AuditResult<UserId> {
        match self.principal {
            Some(Principal::User(id)) => Ok(id),
            _ => Err(AuditError::Validation(
                "This command needs a user; pass --as <email>".into(),
            )),
        }
    }

    pub fn queries(&self) -> QueryService<'_> {
        QueryService::new(
            &**self.auditor.store(),
            &self.storage.users,
            self.catalog,
            self.auditor.registry(),
        )
        .with_page_size(self.settings.page_size)
    }

    /// Resolve a user given by email or ID
    pub fn find_user(&self, identifier: &str) -> AuditResult<UserId> {
        UserService::new(self.storage, self.auditor)
            .find(identifier)?
            .map(|user| user.id)
            .ok_or_else(|| AuditError::user_not_found(identifier))
    }
}

/// Parse a `YYYY-MM-DD` date argument
pub(crate) fn parse_date(value: &str) -> AuditResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AuditError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-03-02").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
        assert!(parse_date("02/03/2026").is_err());
    }
}
