//! Authentication service
//!
//! Sign-in, sign-out, self-registration and password reset. These produce
//! the security events of the audit trail rather than plain entity updates.

use serde_json::Value;

use super::user::{UserInput, UserService};
use crate::audit::{Auditor, FieldMap, Principal, RequestContext};
use crate::crypto::{hash_password, verify_password};
use crate::error::{AuditError, AuditResult};
use crate::models::{User, UserRole};
use crate::storage::Storage;

pub const REASON_UNKNOWN_EMAIL: &str = "Email not registered";
pub const REASON_BAD_PASSWORD: &str = "Invalid credentials";
pub const REASON_SUSPENDED: &str = "Account suspended";

/// Result of a sign-in attempt
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated(User),
    Rejected(&'static str),
}

impl LoginOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Service for authentication flows
pub struct AuthService<'a> {
    storage: &'a Storage,
    auditor: &'a Auditor,
}

impl<'a> AuthService<'a> {
    pub fn new(storage: &'a Storage, auditor: &'a Auditor) -> Self {
        Self { storage, auditor }
    }

    /// Check a password sign-in
    ///
    /// A rejected attempt is not an error; it is returned as
    /// [`LoginOutcome::Rejected`] and recorded as `login_failed`.
    pub fn login(&self, email: &str, password: &str, ctx: &RequestContext) -> AuditResult<LoginOutcome> {
        let user = match self.storage.users.get_by_email(email)? {
            Some(user) => user,
            None => return Ok(self.reject(email, REASON_UNKNOWN_EMAIL, ctx)),
        };

        if !user.is_active() {
            return Ok(self.reject(email, REASON_SUSPENDED, ctx));
        }

        if user.password.is_empty() || !verify_password(password, &user.password) {
            return Ok(self.reject(email, REASON_BAD_PASSWORD, ctx));
        }

        self.auditor
            .login_succeeded(user.id, Some(method_metadata("login_method")), ctx);

        Ok(LoginOutcome::Authenticated(user))
    }

    /// End the session of the user in `ctx`
    pub fn logout(&self, ctx: &RequestContext) -> AuditResult<()> {
        match ctx.principal() {
            Some(Principal::User(user_id)) => {
                self.auditor.logged_out(user_id, ctx);
                Ok(())
            }
            _ => Err(AuditError::Validation("No user is signed in".into())),
        }
    }

    /// Self-registration of a new intern account
    ///
    /// Records the account creation and a `registered` event, both
    /// attributed to the new user.
    pub fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        ctx: &RequestContext,
    ) -> AuditResult<User> {
        let users = UserService::new(self.storage, self.auditor);
        let user = users.build(UserInput::new(name, email, UserRole::Intern).with_password(password))?;
        users.insert(&user)?;

        let as_new_user = ctx.clone().with_principal(Principal::User(user.id));
        self.auditor.on_create(&user, &as_new_user);
        self.auditor
            .registered(user.id, Some(method_metadata("registration_method")), &as_new_user);

        Ok(user)
    }

    /// Replace the password of the account behind `email`
    pub fn reset_password(&self, email: &str, new_password: &str, ctx: &RequestContext) -> AuditResult<User> {
        let mut user = self
            .storage
            .users
            .get_by_email(email)?
            .ok_or_else(|| AuditError::user_not_found(email))?;

        user.password = hash_password(new_password)?;
        user.remember_token = None;
        user.touch();

        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()?;

        self.auditor.password_reset(user.id, ctx);

        Ok(user)
    }

    fn reject(&self, email: &str, reason: &'static str, ctx: &RequestContext) -> LoginOutcome {
        tracing::info!(reason, "sign-in rejected");
        self.auditor.login_failed(email, reason, ctx);
        LoginOutcome::Rejected(reason)
    }
}

fn method_metadata(key: &str) -> FieldMap {
    let mut metadata = FieldMap::new();
    metadata.insert(key.to_string(), Value::from("password"));
    metadata
}
