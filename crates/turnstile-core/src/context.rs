//! Request context types.
//!
//! The [`RequestContext`] carries all per-request state through the
//! middleware chain and into handlers: identity for log correlation, the
//! bound parameters, the security scopes the route requires, and the
//! cancellation signal for the request.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{BoundParams, SecurityRequirement};

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use turnstile_core::RequestId;
///
/// let id = RequestId::new();
/// assert_eq!(id.to_string().len(), 36);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID, e.g. one parsed from an `X-Request-Id` header.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Scopes required by the matched route, keyed by security scheme.
///
/// A scheme present with an empty list is still required; only the
/// absence of the scheme means "not required".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityScopes {
    by_scheme: BTreeMap<String, Vec<String>>,
}

impl SecurityScopes {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the requirements of a route.
    pub fn extend_from(&mut self, requirements: &[SecurityRequirement]) {
        for req in requirements {
            self.by_scheme
                .entry(req.scheme.clone())
                .or_default()
                .extend(req.scopes.iter().cloned());
        }
    }

    /// Scopes for `scheme`, or `None` if the scheme isn't required.
    #[must_use]
    pub fn get(&self, scheme: &str) -> Option<&[String]> {
        self.by_scheme.get(scheme).map(Vec::as_slice)
    }

    /// Returns true if `scheme` is required.
    #[must_use]
    pub fn requires(&self, scheme: &str) -> bool {
        self.by_scheme.contains_key(scheme)
    }

    /// Iterates over `(scheme, scopes)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_scheme
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns true if no scheme is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_scheme.is_empty()
    }
}

/// Per-request context that flows through the middleware chain.
///
/// Owned by exactly one in-flight request. The dispatcher fills in the
/// operation id, bound parameters and scopes before the chain runs.
///
/// # Example
///
/// ```
/// use turnstile_core::RequestContext;
///
/// let ctx = RequestContext::new().with_operation_id("CreateEvent");
/// assert_eq!(ctx.operation_id(), Some("CreateEvent"));
/// assert!(ctx.params().is_empty());
/// assert!(!ctx.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    operation_id: Option<String>,
    params: BoundParams,
    scopes: SecurityScopes,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
    started_at: Instant,
}

impl RequestContext {
    /// Creates a context with a fresh request id and its own token.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// Creates a context observing an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            request_id: RequestId::new(),
            operation_id: None,
            params: BoundParams::new(),
            scopes: SecurityScopes::new(),
            cancellation,
            deadline: None,
            started_at: Instant::now(),
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Replaces the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }

    /// Sets the request ID in place.
    pub fn set_request_id(&mut self, request_id: RequestId) {
        self.request_id = request_id;
    }

    /// Returns the matched operation ID.
    #[must_use]
    pub fn operation_id(&self) -> Option<&str> {
        self.operation_id.as_deref()
    }

    /// Sets the matched operation ID.
    pub fn set_operation_id(&mut self, operation_id: impl Into<String>) {
        self.operation_id = Some(operation_id.into());
    }

    /// Returns a new context with the specified operation ID.
    #[must_use]
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Bound parameters.
    #[must_use]
    pub const fn params(&self) -> &BoundParams {
        &self.params
    }

    /// Installs the bound parameters.
    pub fn set_params(&mut self, params: BoundParams) {
        self.params = params;
    }

    /// Returns a new context with the given parameters.
    #[must_use]
    pub fn with_params(mut self, params: BoundParams) -> Self {
        self.params = params;
        self
    }

    /// Scopes required by the matched route.
    #[must_use]
    pub const fn scopes(&self) -> &SecurityScopes {
        &self.scopes
    }

    /// Attaches the route's security requirements.
    pub fn attach_scopes(&mut self, requirements: &[SecurityRequirement]) {
        self.scopes.extend_from(requirements);
    }

    /// Cancellation token for this request.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns true once the request has been abandoned.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Deadline imposed by the transport, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Sets the deadline.
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Returns a new context with a deadline `timeout` from now.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Time left until the deadline, saturating at zero.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns the elapsed time since the request started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
