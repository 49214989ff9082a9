//! Request ID middleware.
//!
//! Every [`RequestContext`] starts with a fresh UUID v7. This middleware
//! can adopt the caller's `X-Request-Id` instead (for trusted upstreams)
//! and always echoes the effective ID on the response.

use http::HeaderValue;
use turnstile_core::{RequestContext, RequestId};
use uuid::Uuid;

use crate::middleware::{BoxFuture, Middleware, Next};
use crate::types::{Request, Response};

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Propagates request IDs between caller, context and response.
///
/// # Example
///
/// ```rust
/// use turnstile_middleware::stages::RequestIdMiddleware;
///
/// let internal = RequestIdMiddleware::trust_incoming();
/// let public = RequestIdMiddleware::new();
/// # let _ = (internal, public);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestIdMiddleware {
    trust_incoming: bool,
}

impl RequestIdMiddleware {
    /// Creates a middleware that ignores incoming IDs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that adopts a valid incoming `X-Request-Id`.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self { trust_incoming: true }
    }

    fn incoming(&self, request: &Request) -> Option<RequestId> {
        if !self.trust_incoming {
            return None;
        }
        request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(RequestId::from_uuid)
    }
}

impl Middleware for RequestIdMiddleware {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Some(id) = self.incoming(&request) {
                ctx.set_request_id(id);
            }

            let mut response = next.run(ctx, request).await;
            if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            response
        })
    }
}
