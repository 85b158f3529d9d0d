//! Lifecycle interceptor
//!
//! [`Auditor`] turns committed entity mutations and security events into
//! audit records. Every event method funnels into [`Auditor::settle`], the one
//! place where capture and persist failures are logged, counted and dropped.
//! Callers only ever see `Option<AuditRecordId>`.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::action::AuditAction;
use super::auditable::{Auditable, FieldMap, TypeProfile, TypeRegistry};
use super::context::{Clock, ContextResolver, RequestContext, Resolution, ResolvedContext, SystemClock};
use super::diff::diff;
use super::record::{AuditRecord, RecordDraft};
use super::redaction::RedactionPolicy;
use super::store::AuditStore;
use crate::config::Settings;
use crate::error::{AuditError, AuditResult};
use crate::models::{AuditRecordId, User, UserId};

/// Out-of-band counters for the audit write path
#[derive(Debug, Default)]
pub struct AuditHealth {
    recorded: AtomicU64,
    skipped: AtomicU64,
    capture_failures: AtomicU64,
    persist_failures: AtomicU64,
}

/// Point-in-time copy of [`AuditHealth`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub recorded: u64,
    pub skipped: u64,
    pub capture_failures: u64,
    pub persist_failures: u64,
}

impl HealthSnapshot {
    pub fn failures(&self) -> u64 {
        self.capture_failures + self.persist_failures
    }
}

impl AuditHealth {
    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            recorded: self.recorded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            capture_failures: self.capture_failures.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Records audit trail entries for committed mutations and security events
pub struct Auditor {
    store: Arc<dyn AuditStore>,
    policy: RedactionPolicy,
    noise: BTreeSet<String>,
    registry: TypeRegistry,
    record_system_actor: bool,
    principal_type: &'static str,
    clock: Arc<dyn Clock>,
    health: AuditHealth,
}

impl Auditor {
    /// Auditor with default settings
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self::from_settings(store, &Settings::default())
    }

    pub fn from_settings(store: Arc<dyn AuditStore>, settings: &Settings) -> Self {
        Self {
            store,
            policy: RedactionPolicy::new(settings.sensitive_fields.iter().cloned()),
            noise: settings.noise_fields.iter().cloned().collect(),
            registry: TypeRegistry::new(),
            record_system_actor: settings.record_system_actor,
            principal_type: User::TYPE_TAG,
            clock: Arc::new(SystemClock),
            health: AuditHealth::default(),
        }
    }

    /// Register every type in the registry, merging its sensitive fields
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        for (tag, profile) in registry.iter() {
            self.policy.for_type(tag, profile.sensitive_fields.iter().cloned());
        }
        self.registry = registry;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Subject type used for authentication events
    pub fn with_principal_type<T: Auditable>(mut self) -> Self {
        self.principal_type = T::TYPE_TAG;
        self
    }

    pub fn register<T: Auditable>(&mut self, profile: TypeProfile) {
        self.policy.for_type(T::TYPE_TAG, profile.sensitive_fields.iter().cloned());
        self.registry.register::<T>(profile);
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    pub fn health(&self) -> HealthSnapshot {
        self.health.snapshot()
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Entity lifecycle events
    // ------------------------------------------------------------------

    /// Snapshot taken before a mutation, for [`Auditor::on_update`]
    ///
    /// A failure is counted as a capture failure and costs only the record.
    pub fn capture_original<T: Auditable>(&self, entity: &T) -> Option<FieldMap> {
        match entity.snapshot() {
            Ok(fields) => Some(fields),
            Err(e) => {
                self.capture_failed(&AuditAction::Updated, T::TYPE_TAG, &e);
                None
            }
        }
    }

    /// Record a newly committed entity
    pub fn on_create<T: Auditable>(&self, entity: &T, ctx: &RequestContext) -> Option<AuditRecordId> {
        let outcome = self.admit(ctx, false).map(|resolved| -> AuditResult<Option<AuditRecord>> {
            let after = entity.snapshot()?;
            Ok(Some(self.seal(
                AuditRecord::draft(AuditAction::Created, T::TYPE_TAG)
                    .subject_id(entity.primary_key())
                    .after(Some(after)),
                &resolved,
                None,
            )))
        });
        self.settle(AuditAction::Created, T::TYPE_TAG, outcome)
    }

    /// Record the changed fields of an updated entity
    ///
    /// `original` is the snapshot taken before the mutation. Nothing is
    /// recorded when only noise fields changed.
    pub fn on_update<T: Auditable>(
        &self,
        entity: &T,
        original: &FieldMap,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        let outcome = self.admit(ctx, false).map(|resolved| -> AuditResult<Option<AuditRecord>> {
            let current = entity.snapshot()?;
            let changes = diff(original, &current, &self.noise);
            if !changes.is_material() {
                tracing::debug!(subject_type = T::TYPE_TAG, "no material change, nothing recorded");
                return Ok(None);
            }

            let (before, after) = changes.into_states();
            Ok(Some(self.seal(
                AuditRecord::draft(AuditAction::Updated, T::TYPE_TAG)
                    .subject_id(entity.primary_key())
                    .before(Some(before))
                    .after(Some(after)),
                &resolved,
                None,
            )))
        });
        self.settle(AuditAction::Updated, T::TYPE_TAG, outcome)
    }

    /// Record a deleted (or soft-deleted) entity
    pub fn on_delete<T: Auditable>(&self, entity: &T, ctx: &RequestContext) -> Option<AuditRecordId> {
        let outcome = self.admit(ctx, false).map(|resolved| -> AuditResult<Option<AuditRecord>> {
            let before = entity.snapshot()?;
            Ok(Some(self.seal(
                AuditRecord::draft(AuditAction::Deleted, T::TYPE_TAG)
                    .subject_id(entity.primary_key())
                    .before(Some(before)),
                &resolved,
                None,
            )))
        });
        self.settle(AuditAction::Deleted, T::TYPE_TAG, outcome)
    }

    /// Record an entity brought back from soft deletion
    pub fn on_restore<T: Auditable>(&self, entity: &T, ctx: &RequestContext) -> Option<AuditRecordId> {
        let outcome = self.admit(ctx, false).map(|resolved| -> AuditResult<Option<AuditRecord>> {
            let after = entity.snapshot()?;
            Ok(Some(self.seal(
                AuditRecord::draft(AuditAction::Restored, T::TYPE_TAG)
                    .subject_id(entity.primary_key())
                    .after(Some(after)),
                &resolved,
                None,
            )))
        });
        self.settle(AuditAction::Restored, T::TYPE_TAG, outcome)
    }

    /// Record an arbitrary action against a specific entity
    pub fn custom<T: Auditable>(
        &self,
        entity: &T,
        action: AuditAction,
        metadata: Option<FieldMap>,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        let outcome = self.admit(ctx, false).map(|resolved| -> AuditResult<Option<AuditRecord>> {
            Ok(Some(self.seal(
                AuditRecord::draft(action.clone(), T::TYPE_TAG).subject_id(entity.primary_key()),
                &resolved,
                metadata,
            )))
        });
        self.settle(action, T::TYPE_TAG, outcome)
    }

    // ------------------------------------------------------------------
    // Security events
    // ------------------------------------------------------------------

    pub fn login_succeeded(
        &self,
        actor: UserId,
        metadata: Option<FieldMap>,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        self.principal_event(AuditAction::Login, actor, metadata, ctx)
    }

    /// Record a failed authentication attempt
    ///
    /// Always recorded, even without any resolvable actor.
    pub fn login_failed(
        &self,
        attempted_identity: &str,
        reason: &str,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        let outcome = self.admit(ctx, true).map(|resolved| -> AuditResult<Option<AuditRecord>> {
            let mut metadata = FieldMap::new();
            metadata.insert("attempted_identity".into(), Value::from(attempted_identity));
            metadata.insert("failure_reason".into(), Value::from(reason));
            Ok(Some(self.seal(
                AuditRecord::draft(AuditAction::LoginFailed, self.principal_type),
                &resolved,
                Some(metadata),
            )))
        });
        self.settle(AuditAction::LoginFailed, self.principal_type, outcome)
    }

    pub fn registered(
        &self,
        actor: UserId,
        metadata: Option<FieldMap>,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        self.principal_event(AuditAction::Registered, actor, metadata, ctx)
    }

    pub fn logged_out(&self, actor: UserId, ctx: &RequestContext) -> Option<AuditRecordId> {
        self.principal_event(AuditAction::Logout, actor, None, ctx)
    }

    pub fn password_reset(&self, actor: UserId, ctx: &RequestContext) -> Option<AuditRecordId> {
        self.principal_event(AuditAction::PasswordReset, actor, None, ctx)
    }

    /// Record that a filtered slice of some subject type left the system
    pub fn data_exported(
        &self,
        subject_type: &str,
        metadata: Option<FieldMap>,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        self.transfer_event(AuditAction::Export, subject_type, metadata, ctx)
    }

    pub fn data_imported(
        &self,
        subject_type: &str,
        metadata: Option<FieldMap>,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        self.transfer_event(AuditAction::Import, subject_type, metadata, ctx)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Event about the acting principal itself; the actor is explicit
    fn principal_event(
        &self,
        action: AuditAction,
        actor: UserId,
        metadata: Option<FieldMap>,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        let resolved = ContextResolver::resolve(ctx).acting_as(actor);
        let record = self.seal(
            AuditRecord::draft(action.clone(), self.principal_type)
                .subject_id(actor.as_uuid().to_string()),
            &resolved,
            metadata,
        );
        self.settle(action, self.principal_type, Some(Ok(Some(record))))
    }

    fn transfer_event(
        &self,
        action: AuditAction,
        subject_type: &str,
        metadata: Option<FieldMap>,
        ctx: &RequestContext,
    ) -> Option<AuditRecordId> {
        let outcome = self.admit(ctx, false).map(|resolved| -> AuditResult<Option<AuditRecord>> {
            Ok(Some(self.seal(
                AuditRecord::draft(action.clone(), subject_type),
                &resolved,
                metadata,
            )))
        });
        self.settle(action, subject_type, outcome)
    }

    /// Apply the skip policy; None means the event is dropped
    fn admit(&self, ctx: &RequestContext, always: bool) -> Option<ResolvedContext> {
        let resolved = ContextResolver::resolve(ctx);
        if always {
            return Some(resolved);
        }
        match resolved.resolution {
            Resolution::User(_) => Some(resolved),
            Resolution::System if self.record_system_actor => Some(resolved),
            Resolution::System => {
                tracing::debug!("system actor recording disabled, event dropped");
                None
            }
            Resolution::Anonymous => {
                tracing::debug!("no resolvable actor, event dropped");
                None
            }
        }
    }

    /// Redact, attach context and timestamp the draft
    fn seal(&self, draft: RecordDraft, ctx: &ResolvedContext, metadata: Option<FieldMap>) -> AuditRecord {
        let mut metadata = metadata;
        if ctx.is_system() {
            metadata
                .get_or_insert_with(FieldMap::new)
                .insert("triggered_by".into(), Value::from("system"));
        }

        let draft = draft.context(ctx).redacted(&self.policy);
        let metadata = self.policy.apply(draft.subject_type(), metadata);
        draft.metadata(metadata).build(self.clock.now())
    }

    fn capture_failed(&self, action: &AuditAction, subject_type: &str, error: &AuditError) {
        AuditHealth::bump(&self.health.capture_failures);
        tracing::warn!(action = %action, subject_type, error = %error, "audit capture failed");
    }

    /// The single failure boundary of the write path
    fn settle(
        &self,
        action: AuditAction,
        subject_type: &str,
        outcome: Option<AuditResult<Option<AuditRecord>>>,
    ) -> Option<AuditRecordId> {
        let record = match outcome {
            None | Some(Ok(None)) => {
                AuditHealth::bump(&self.health.skipped);
                return None;
            }
            Some(Ok(Some(record))) => record,
            Some(Err(e)) => {
                self.capture_failed(&action, subject_type, &e);
                return None;
            }
        };

        let id = record.id();
        match self.store.append(record) {
            Ok(()) => {
                AuditHealth::bump(&self.health.recorded);
                tracing::trace!(action = %action, subject_type, record = %id, "audit record persisted");
                Some(id)
            }
            Err(e) => {
                AuditHealth::bump(&self.health.persist_failures);
                let e = if matches!(e, AuditError::Persist(_)) {
                    e
                } else {
                    AuditError::Persist(e.to_string())
                };
                tracing::error!(action = %action, subject_type, error = %e, "audit record dropped");
                None
            }
        }
    }
}
