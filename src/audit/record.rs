//! Audit record data structure
//!
//! An [`AuditRecord`] is immutable once built: its fields are private and only
//! read accessors are exposed. Records are assembled through [`RecordDraft`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::AuditAction;
use super::auditable::{short_type_name, FieldMap};
use super::context::ResolvedContext;
use super::diff::{diff, summarize, FieldDiff};
use super::redaction::RedactionPolicy;
use crate::models::{AuditRecordId, UserId};

/// A single persisted audit trail entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    id: AuditRecordId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    actor_id: Option<UserId>,

    action: AuditAction,

    subject_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    subject_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    before_state: Option<FieldMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    after_state: Option<FieldMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<FieldMap>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    network_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    http_verb: Option<String>,

    created_at: DateTime<Utc>,
}

impl AuditRecord {
    /// Start a record for an action on a subject type
    pub fn draft(action: AuditAction, subject_type: impl Into<String>) -> RecordDraft {
        RecordDraft {
            actor_id: None,
            action,
            subject_type: subject_type.into(),
            subject_id: None,
            before_state: None,
            after_state: None,
            metadata: None,
            network_address: None,
            user_agent: None,
            request_path: None,
            http_verb: None,
        }
    }

    pub fn id(&self) -> AuditRecordId {
        self.id
    }

    pub fn actor_id(&self) -> Option<UserId> {
        self.actor_id
    }

    pub fn action(&self) -> &AuditAction {
        &self.action
    }

    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    pub fn before_state(&self) -> Option<&FieldMap> {
        self.before_state.as_ref()
    }

    pub fn after_state(&self) -> Option<&FieldMap> {
        self.after_state.as_ref()
    }

    pub fn metadata(&self) -> Option<&FieldMap> {
        self.metadata.as_ref()
    }

    pub fn network_address(&self) -> Option<&str> {
        self.network_address.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn request_path(&self) -> Option<&str> {
        self.request_path.as_deref()
    }

    pub fn http_verb(&self) -> Option<&str> {
        self.http_verb.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Ordering key: creation time, tie-broken by id
    pub fn sort_key(&self) -> (DateTime<Utc>, AuditRecordId) {
        (self.created_at, self.id)
    }

    /// Field changes between the stored before and after states
    pub fn computed_diff(&self) -> FieldDiff {
        let empty = FieldMap::new();
        diff(
            self.before_state.as_ref().unwrap_or(&empty),
            self.after_state.as_ref().unwrap_or(&empty),
            &Default::default(),
        )
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {}",
            self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action.code().to_uppercase(),
            short_type_name(&self.subject_type),
        );

        if let Some(subject_id) = &self.subject_id {
            output.push_str(&format!(" {}", subject_id));
        }

        match self.actor_id {
            Some(actor) => output.push_str(&format!(" by {}", actor)),
            None => output.push_str(" by system"),
        }

        if let Some(changes) = summarize(&self.computed_diff()) {
            output.push_str(&format!("\n  Changes: {}", changes));
        }

        output
    }
}

/// Builder for a record that has not been persisted yet
#[derive(Debug, Clone)]
pub struct RecordDraft {
    actor_id: Option<UserId>,
    action: AuditAction,
    subject_type: String,
    subject_id: Option<String>,
    before_state: Option<FieldMap>,
    after_state: Option<FieldMap>,
    metadata: Option<FieldMap>,
    network_address: Option<String>,
    user_agent: Option<String>,
    request_path: Option<String>,
    http_verb: Option<String>,
}

impl RecordDraft {
    pub fn subject_type(&self) -> &str {
        &self.subject_type
    }

    /// Mask sensitive fields in both states for the draft's subject type
    pub fn redacted(mut self, policy: &RedactionPolicy) -> Self {
        self.before_state = policy.apply(&self.subject_type, self.before_state.take());
        self.after_state = policy.apply(&self.subject_type, self.after_state.take());
        self
    }

    pub fn subject_id(mut self, subject_id: impl Into<String>) -> Self {
        self.subject_id = Some(subject_id.into());
        self
    }

    pub fn actor(mut self, actor_id: Option<UserId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn before(mut self, state: Option<FieldMap>) -> Self {
        self.before_state = state;
        self
    }

    pub fn after(mut self, state: Option<FieldMap>) -> Self {
        self.after_state = state;
        self
    }

    pub fn metadata(mut self, metadata: Option<FieldMap>) -> Self {
        self.metadata = metadata.filter(|m| !m.is_empty());
        self
    }

    /// Attach actor and request fields from a resolved context
    pub fn context(mut self, ctx: &ResolvedContext) -> Self {
        self.actor_id = ctx.actor_id();
        self.network_address = ctx.network_address.clone();
        self.user_agent = ctx.user_agent.clone();
        self.request_path = ctx.request_path.clone();
        self.http_verb = ctx.http_verb.clone();
        self
    }

    /// Seal the draft with a fresh id and timestamp
    pub fn build(self, created_at: DateTime<Utc>) -> AuditRecord {
        AuditRecord {
            id: AuditRecordId::new(),
            actor_id: self.actor_id,
            action: self.action,
            subject_type: self.subject_type,
            subject_id: self.subject_id,
            before_state: self.before_state,
            after_state: self.after_state,
            metadata: self.metadata,
            network_address: self.network_address,
            user_agent: self.user_agent,
            request_path: self.request_path,
            http_verb: self.http_verb,
            created_at,
        }
    }
}
