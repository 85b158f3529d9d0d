//! User model
//!
//! Portal accounts for administrators, mentors and interns. Credential
//! fields are serialized like every other field; the audit redaction policy
//! masks them before anything is persisted to the trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;
use crate::audit::{ActorSummary, Auditable, TypeProfile};

/// Role of a portal account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Mentor,
    #[default]
    Intern,
}

impl UserRole {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "mentor" | "pembimbing" => Some(Self::Mentor),
            "intern" | "peserta" => Some(Self::Intern),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "Admin"),
            Self::Mentor => write!(f, "Mentor"),
            Self::Intern => write!(f, "Intern"),
        }
    }
}

/// Whether the account may sign in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

/// A portal account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,

    pub name: String,

    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    pub role: UserRole,

    pub status: UserStatus,

    /// Argon2 PHC hash; empty for accounts that only sign in with Google
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub remember_token: Option<String>,

    #[serde(default)]
    pub google_id: Option<String>,

    /// Identity card number (NIK)
    #[serde(default)]
    pub national_id: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new active user
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: name.into(),
            email: normalize_email(&email.into()),
            phone: None,
            role,
            status: UserStatus::Active,
            password: String::new(),
            remember_token: None,
            google_id: None,
            national_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Profile registered for this type in the audit registry
    pub fn audit_profile() -> TypeProfile {
        TypeProfile::labelled("User").with_sensitive_fields(["national_id"])
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn soft_delete(&mut self) {
        self.deleted_at = Some(Utc::now());
        self.status = UserStatus::Inactive;
        self.touch();
    }

    pub fn restore(&mut self) {
        self.deleted_at = None;
        self.status = UserStatus::Active;
        self.touch();
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active && !self.is_deleted()
    }

    /// Display data for the audit trail
    pub fn summary(&self) -> ActorSummary {
        ActorSummary {
            id: self.id,
            name: self.name.clone(),
            contact: self.email.clone(),
        }
    }

    /// Validate the user
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }

        if self.name.chars().count() > 255 {
            return Err(UserValidationError::NameTooLong(self.name.chars().count()));
        }

        let valid_email = match self.email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if !valid_email {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }

        Ok(())
    }
}

impl Auditable for User {
    const TYPE_TAG: &'static str = "models::User";

    fn primary_key(&self) -> String {
        self.id.as_uuid().to_string()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Lowercase and trim an email address for lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validation errors for users
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidEmail(String),
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "User name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "User name too long ({} chars, max 255)", len),
            Self::InvalidEmail(email) => write!(f, "Invalid email address: '{}'", email),
        }
    }
}

impl std::error::Error for UserValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new("Rina", "  Rina@Portal.ID ", UserRole::Admin);
        assert_eq!(user.email, "rina@portal.id");
        assert!(user.is_active());
    }

    #[test]
    fn test_validation() {
        let mut user = User::new("Rina", "rina@portal.id", UserRole::Intern);
        assert!(user.validate().is_ok());

        user.email = "not-an-email".into();
        assert!(matches!(
            user.validate(),
            Err(UserValidationError::InvalidEmail(_))
        ));

        user.name = "  ".into();
        assert_eq!(user.validate(), Err(UserValidationError::EmptyName));
    }

    #[test]
    fn test_soft_delete_deactivates() {
        let mut user = User::new("Bima", "bima@portal.id", UserRole::Mentor);
        user.soft_delete();
        assert!(!user.is_active());
        assert_eq!(user.status, UserStatus::Inactive);

        user.restore();
        assert!(user.is_active());
    }

    #[test]
    fn test_snapshot_contains_credentials_before_redaction() {
        let mut user = User::new("Bima", "bima@portal.id", UserRole::Mentor);
        user.google_id = Some("1098".into());
        let snapshot = user.snapshot().unwrap();
        assert!(snapshot.contains_key("password"));
        assert_eq!(snapshot.get("google_id"), Some(&serde_json::json!("1098")));
    }

    #[test]
    fn test_summary() {
        let user = User::new("Bima", "bima@portal.id", UserRole::Mentor);
        let summary = user.summary();
        assert_eq!(summary.name, "Bima");
        assert_eq!(summary.contact, "bima@portal.id");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(UserRole::parse("Pembimbing"), Some(UserRole::Mentor));
        assert_eq!(UserRole::parse("root"), None);
    }
}
