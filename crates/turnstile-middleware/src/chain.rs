//! Composed middleware chains.
//!
//! A [`Chain`] is built once per route: the global middleware followed by
//! the route's own middleware, terminated by the handler. The composed
//! sequence is frozen at construction; a request walks it with a borrowed
//! [`Next`] cursor and allocates nothing for the chain itself. Each
//! middleware wraps the next, outermost first, so `[A, B]` runs
//! `A.pre → B.pre → handler → B.post → A.post`.

use std::fmt;
use std::sync::Arc;

use turnstile_core::RequestContext;

use crate::middleware::{Endpoint, Middleware, Next};
use crate::types::{Request, Response};

/// A type-erased middleware that can be shared between chains.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// A type-erased endpoint.
pub type BoxedEndpoint = Arc<dyn Endpoint>;

/// Middleware around one endpoint, fixed at construction.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use turnstile_middleware::{Chain, FnMiddleware, Request, Response, ResponseExt};
/// use turnstile_core::RequestContext;
/// use http::StatusCode;
///
/// async fn handler(_ctx: RequestContext, _req: Request) -> Response {
///     Response::text(StatusCode::OK, "CreateEvent")
/// }
///
/// let audit = FnMiddleware::new("audit", |ctx, req, next| {
///     Box::pin(async move { next.run(ctx, req).await })
/// });
///
/// let chain = Chain::new(vec![Arc::new(audit)], Arc::new(handler));
/// assert_eq!(chain.names(), vec!["audit"]);
/// ```
#[derive(Clone)]
pub struct Chain {
    middleware: Arc<[BoxedMiddleware]>,
    endpoint: BoxedEndpoint,
}

impl Chain {
    /// Composes `middleware` (outermost first) around `endpoint`.
    #[must_use]
    pub fn new(middleware: Vec<BoxedMiddleware>, endpoint: BoxedEndpoint) -> Self {
        Self {
            middleware: middleware.into(),
            endpoint,
        }
    }

    /// A chain with no middleware.
    #[must_use]
    pub fn endpoint_only(endpoint: BoxedEndpoint) -> Self {
        Self::new(Vec::new(), endpoint)
    }

    /// Runs the request through every middleware and the endpoint.
    pub async fn run(&self, ctx: &mut RequestContext, request: Request) -> Response {
        Next::new(&self.middleware, self.endpoint.as_ref())
            .run(ctx, request)
            .await
    }

    /// Middleware names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.middleware.iter().map(|m| m.name()).collect()
    }

    /// Number of middleware in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    /// Returns true if the chain calls the endpoint directly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("middleware", &self.names())
            .finish_non_exhaustive()
    }
}
