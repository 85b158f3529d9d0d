//! Logbook model
//!
//! Daily activity entries written by interns and reviewed by mentors.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{LogbookId, UserId};
use crate::audit::Auditable;

/// Review state of an entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogbookStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl LogbookStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "submitted" => Some(Self::Submitted),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for LogbookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "Draft"),
            Self::Submitted => write!(f, "Submitted"),
            Self::Approved => write!(f, "Approved"),
            Self::Rejected => write!(f, "Rejected"),
        }
    }
}

/// One day of intern activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Logbook {
    pub id: LogbookId,

    /// Intern who wrote the entry
    pub user_id: UserId,

    pub date: NaiveDate,

    pub activity: String,

    #[serde(default)]
    pub description: String,

    pub duration_hours: f64,

    pub status: LogbookStatus,

    #[serde(default)]
    pub mentor_notes: Option<String>,

    #[serde(default)]
    pub approved_by: Option<UserId>,

    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Logbook {
    /// Create a new draft entry
    pub fn new(
        user_id: UserId,
        date: NaiveDate,
        activity: impl Into<String>,
        duration_hours: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: LogbookId::new(),
            user_id,
            date,
            activity: activity.into(),
            description: String::new(),
            duration_hours,
            status: LogbookStatus::Draft,
            mentor_notes: None,
            approved_by: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn submit(&mut self) {
        self.status = LogbookStatus::Submitted;
        self.touch();
    }

    pub fn approve(&mut self, mentor: UserId, notes: Option<String>) {
        self.status = LogbookStatus::Approved;
        self.approved_by = Some(mentor);
        self.approved_at = Some(Utc::now());
        self.mentor_notes = notes;
        self.touch();
    }

    pub fn reject(&mut self, mentor: UserId, notes: Option<String>) {
        self.status = LogbookStatus::Rejected;
        self.approved_by = Some(mentor);
        self.approved_at = None;
        self.mentor_notes = notes;
        self.touch();
    }

    /// Validate the entry
    pub fn validate(&self) -> Result<(), LogbookValidationError> {
        if self.activity.trim().is_empty() {
            return Err(LogbookValidationError::EmptyActivity);
        }

        if !(0.0..=24.0).contains(&self.duration_hours) || self.duration_hours.is_nan() {
            return Err(LogbookValidationError::InvalidDuration(self.duration_hours));
        }

        Ok(())
    }
}

impl Auditable for Logbook {
    const TYPE_TAG: &'static str = "models::Logbook";

    fn primary_key(&self) -> String {
        self.id.as_uuid().to_string()
    }
}

impl fmt::Display for Logbook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({}h)", self.date, self.activity, self.duration_hours)
    }
}

/// Validation errors for logbook entries
#[derive(Debug, Clone, PartialEq)]
pub enum LogbookValidationError {
    EmptyActivity,
    InvalidDuration(f64),
}

impl fmt::Display for LogbookValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyActivity => write!(f, "Logbook activity cannot be empty"),
            Self::InvalidDuration(hours) => {
                write!(f, "Logbook duration must be between 0 and 24 hours, got {}", hours)
            }
        }
    }
}

impl std::error::Error for LogbookValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> Logbook {
        Logbook::new(
            UserId::new(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            "Set up CI pipeline",
            6.5,
        )
    }

    #[test]
    fn test_new_entry_is_draft() {
        let logbook = entry();
        assert_eq!(logbook.status, LogbookStatus::Draft);
        assert!(logbook.validate().is_ok());
    }

    #[test]
    fn test_review_flow() {
        let mentor = UserId::new();
        let mut logbook = entry();
        logbook.submit();
        assert_eq!(logbook.status, LogbookStatus::Submitted);

        logbook.approve(mentor, Some("Good work".into()));
        assert_eq!(logbook.status, LogbookStatus::Approved);
        assert_eq!(logbook.approved_by, Some(mentor));
        assert!(logbook.approved_at.is_some());

        logbook.reject(mentor, None);
        assert!(logbook.approved_at.is_none());
    }

    #[test]
    fn test_invalid_duration() {
        let mut logbook = entry();
        logbook.duration_hours = 25.0;
        assert_eq!(
            logbook.validate(),
            Err(LogbookValidationError::InvalidDuration(25.0))
        );
    }
}
