//! User account service

use crate::audit::{Auditor, RequestContext};
use crate::crypto::hash_password;
use crate::error::{AuditError, AuditResult};
use crate::models::{User, UserId, UserRole, UserStatus};
use crate::storage::Storage;

/// Fields of a new account
#[derive(Debug, Clone)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Plain-text password, hashed before storage
    pub password: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    pub google_id: Option<String>,
}

impl UserInput {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
            password: None,
            phone: None,
            national_id: None,
            google_id: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// Partial update of an account; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub status: Option<UserStatus>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    /// New plain-text password
    pub password: Option<String>,
}

/// Service for portal accounts
pub struct UserService<'a> {
    storage: &'a Storage,
    auditor: &'a Auditor,
}

impl<'a> UserService<'a> {
    pub fn new(storage: &'a Storage, auditor: &'a Auditor) -> Self {
        Self { storage, auditor }
    }

    /// Create an account
    pub fn create(&self, input: UserInput, ctx: &RequestContext) -> AuditResult<User> {
        let user = self.build(input)?;
        self.insert(&user)?;
        self.auditor.on_create(&user, ctx);
        Ok(user)
    }

    /// Validate, hash and check uniqueness without committing
    pub(crate) fn build(&self, input: UserInput) -> AuditResult<User> {
        let mut user = User::new(input.name.trim(), input.email, input.role);
        user.phone = input.phone;
        user.national_id = input.national_id;
        user.google_id = input.google_id;
        if let Some(password) = input.password {
            user.password = hash_password(&password)?;
        }

        user.validate()
            .map_err(|e| AuditError::Validation(e.to_string()))?;

        if self.storage.users.email_exists(&user.email, None)? {
            return Err(AuditError::Duplicate {
                entity_type: "User",
                identifier: user.email.clone(),
            });
        }

        Ok(user)
    }

    pub(crate) fn insert(&self, user: &User) -> AuditResult<()> {
        self.storage.users.upsert(user.clone())?;
        self.storage.users.save()
    }

    /// Edit an account
    pub fn update(&self, id: UserId, changes: UserChanges, ctx: &RequestContext) -> AuditResult<User> {
        let mut user = self.require(id)?;
        let original = self.auditor.capture_original(&user);

        if let Some(name) = changes.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = changes.email {
            user.email = crate::models::user::normalize_email(&email);
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(status) = changes.status {
            user.status = status;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(national_id) = changes.national_id {
            user.national_id = Some(national_id);
        }
        if let Some(password) = changes.password {
            user.password = hash_password(&password)?;
        }
        user.touch();

        user.validate()
            .map_err(|e| AuditError::Validation(e.to_string()))?;

        if self.storage.users.email_exists(&user.email, Some(user.id))? {
            return Err(AuditError::Duplicate {
                entity_type: "User",
                identifier: user.email.clone(),
            });
        }

        self.insert(&user)?;

        if let Some(original) = original {
            self.auditor.on_update(&user, &original, ctx);
        }

        Ok(user)
    }

    /// Deactivate and soft-delete an account
    pub fn delete(&self, id: UserId, ctx: &RequestContext) -> AuditResult<User> {
        let mut user = self.require(id)?;
        if user.is_deleted() {
            return Err(AuditError::Validation(format!(
                "User '{}' is already deleted",
                user.email
            )));
        }

        user.soft_delete();
        self.insert(&user)?;

        self.auditor.on_delete(&user, ctx);

        Ok(user)
    }

    pub fn restore(&self, id: UserId, ctx: &RequestContext) -> AuditResult<User> {
        let mut user = self.require(id)?;
        if !user.is_deleted() {
            return Err(AuditError::Validation(format!(
                "User '{}' is not deleted",
                user.email
            )));
        }

        user.restore();
        self.insert(&user)?;

        self.auditor.on_restore(&user, ctx);

        Ok(user)
    }

    pub fn get(&self, id: UserId) -> AuditResult<Option<User>> {
        self.storage.users.get(id)
    }

    /// Find an account by email or ID
    pub fn find(&self, identifier: &str) -> AuditResult<Option<User>> {
        if let Some(user) = self.storage.users.get_by_email(identifier)? {
            return Ok(Some(user));
        }

        if let Ok(id) = identifier.parse::<UserId>() {
            return self.storage.users.get(id);
        }

        Ok(None)
    }

    pub fn list(&self) -> AuditResult<Vec<User>> {
        self.storage.users.get_all()
    }

    fn require(&self, id: UserId) -> AuditResult<User> {
        self.storage
            .users
            .get(id)?
            .ok_or_else(|| AuditError::user_not_found(id.to_string()))
    }
}
