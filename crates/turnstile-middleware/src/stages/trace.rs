//! Request span middleware.
//!
//! Wraps the rest of the chain in a `tracing` span carrying the request
//! ID, operation ID, method and path, and logs the outcome on the way out.

use tracing::Instrument;
use turnstile_core::RequestContext;

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// Opens one span per dispatched request.
#[derive(Debug, Clone)]
pub struct TracingMiddleware {
    service_name: String,
}

impl TracingMiddleware {
    /// Creates the middleware; `service_name` is recorded on every span.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl Default for TracingMiddleware {
    fn default() -> Self {
        Self::new("turnstile")
    }
}

impl Middleware for TracingMiddleware {
    fn name(&self) -> &'static str {
        "tracing"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        let span = tracing::info_span!(
            "request",
            service = %self.service_name,
            request_id = %ctx.request_id(),
            operation_id = ctx.operation_id().unwrap_or_default(),
            http.method = %request.method(),
            http.path = request.uri().path(),
            http.status_code = tracing::field::Empty,
        );

        Box::pin(
            async move {
                let response = next.run(ctx, request).await;
                tracing::Span::current().record("http.status_code", response.status().as_u16());
                tracing::debug!(elapsed = ?ctx.elapsed(), "request handled");
                response
            }
            .instrument(span),
        )
    }
}
