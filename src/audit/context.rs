//! Request context capture
//!
//! The acting principal and request metadata are passed explicitly with every
//! call that can produce an audit record. Nothing is read from global state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::models::UserId;

/// Column limits carried over from the persisted record layout
const MAX_NETWORK_ADDRESS_LEN: usize = 45;
const MAX_HTTP_VERB_LEN: usize = 10;
const MAX_REQUEST_PATH_LEN: usize = 255;

/// Who is performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "id")]
pub enum Principal {
    /// An authenticated portal user
    User(UserId),
    /// An explicit system invocation (scheduler, migration)
    System,
}

/// Caller-supplied context for one triggering operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    principal: Option<Principal>,
    network_address: Option<String>,
    user_agent: Option<String>,
    request_path: Option<String>,
    http_verb: Option<String>,
}

impl RequestContext {
    /// No actor and no request, e.g. a batch job without a system principal
    pub fn none() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: UserId) -> Self {
        Self {
            principal: Some(Principal::User(user_id)),
            ..Self::default()
        }
    }

    pub fn system() -> Self {
        Self {
            principal: Some(Principal::System),
            ..Self::default()
        }
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn with_network_address(mut self, address: impl Into<String>) -> Self {
        self.network_address = Some(address.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the verb and logical path of the request
    pub fn with_request(mut self, verb: impl Into<String>, path: impl Into<String>) -> Self {
        self.http_verb = Some(verb.into());
        self.request_path = Some(path.into());
        self
    }

    pub fn principal(&self) -> Option<Principal> {
        self.principal
    }
}

/// Outcome of resolving the acting principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    User(UserId),
    System,
    /// No authenticated actor and no explicit system invocation
    Anonymous,
}

/// Normalized context attached to a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub resolution: Resolution,
    pub network_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_path: Option<String>,
    pub http_verb: Option<String>,
}

impl ResolvedContext {
    pub fn actor_id(&self) -> Option<UserId> {
        match self.resolution {
            Resolution::User(id) => Some(id),
            Resolution::System | Resolution::Anonymous => None,
        }
    }

    pub fn is_system(&self) -> bool {
        self.resolution == Resolution::System
    }

    /// Replace the resolved actor with one named explicitly by the event
    pub fn acting_as(mut self, actor: UserId) -> Self {
        self.resolution = Resolution::User(actor);
        self
    }
}

/// Extracts actor and request metadata at the moment of an event
pub struct ContextResolver;

impl ContextResolver {
    pub fn resolve(ctx: &RequestContext) -> ResolvedContext {
        let resolution = match ctx.principal {
            Some(Principal::User(id)) => Resolution::User(id),
            Some(Principal::System) => Resolution::System,
            None => Resolution::Anonymous,
        };

        ResolvedContext {
            resolution,
            network_address: clean(ctx.network_address.as_deref())
                .map(|a| truncate_chars(a, MAX_NETWORK_ADDRESS_LEN)),
            user_agent: clean(ctx.user_agent.as_deref()).map(str::to_string),
            request_path: clean(ctx.request_path.as_deref())
                .map(|p| truncate_chars(p, MAX_REQUEST_PATH_LEN)),
            http_verb: clean(ctx.http_verb.as_deref())
                .map(|v| truncate_chars(&v.to_uppercase(), MAX_HTTP_VERB_LEN)),
        }
    }
}

fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Source of record timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that advances by a fixed step on every reading
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Mutex::new(start),
            step,
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let mut next = match self.next.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let current = *next;
        *next = current + self.step;
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_user() {
        let user = UserId::new();
        let ctx = RequestContext::for_user(user)
            .with_network_address("10.0.0.1")
            .with_user_agent("Mozilla/5.0")
            .with_request("post", "/admin/jobs");

        let resolved = ContextResolver::resolve(&ctx);
        assert_eq!(resolved.resolution, Resolution::User(user));
        assert_eq!(resolved.actor_id(), Some(user));
        assert_eq!(resolved.http_verb.as_deref(), Some("POST"));
        assert_eq!(resolved.request_path.as_deref(), Some("/admin/jobs"));
        assert_eq!(resolved.network_address.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_resolve_without_context_is_anonymous() {
        let resolved = ContextResolver::resolve(&RequestContext::none());
        assert_eq!(resolved.resolution, Resolution::Anonymous);
        assert!(resolved.actor_id().is_none());
        assert!(resolved.network_address.is_none());
    }

    #[test]
    fn test_resolve_system() {
        let resolved = ContextResolver::resolve(&RequestContext::system());
        assert!(resolved.is_system());
        assert!(resolved.actor_id().is_none());
    }

    #[test]
    fn test_fields_are_normalized() {
        let long_address = "f".repeat(60);
        let ctx = RequestContext::none()
            .with_network_address(long_address)
            .with_user_agent("   ")
            .with_request("propfind-extended", "/x");

        let resolved = ContextResolver::resolve(&ctx);
        assert_eq!(resolved.network_address.unwrap().len(), 45);
        assert!(resolved.user_agent.is_none());
        assert_eq!(resolved.http_verb.as_deref(), Some("PROPFIND-E"));
    }

    #[test]
    fn test_acting_as_overrides_resolution() {
        let user = UserId::new();
        let resolved = ContextResolver::resolve(&RequestContext::none()).acting_as(user);
        assert_eq!(resolved.actor_id(), Some(user));
    }

    #[test]
    fn test_stepping_clock() {
        let start = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let clock = SteppingClock::new(start, Duration::seconds(1));
        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start + Duration::seconds(1));
    }
}
