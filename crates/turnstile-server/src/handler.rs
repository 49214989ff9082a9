//! Handler registration.
//!
//! Handlers are wired to contract operations by operation ID. Every handler
//! is an [`Endpoint`]: any `Fn(RequestContext, Request) -> impl Future<Output
//! = Response>` qualifies. [`typed`] adapts a handler that wants its bound
//! parameters as a tuple.
//!
//! # Example
//!
//! ```rust
//! use turnstile_server::{typed, HandlerRegistry};
//! use turnstile_middleware::{Request, Response, ResponseExt};
//! use turnstile_core::RequestContext;
//! use http::StatusCode;
//!
//! async fn create_event(_ctx: RequestContext, _req: Request) -> Response {
//!     Response::text(StatusCode::OK, "CreateEvent")
//! }
//!
//! async fn send_invitations(
//!     _ctx: RequestContext,
//!     _req: Request,
//!     (account_id, event_id): (i64, i64),
//! ) -> Response {
//!     Response::text(StatusCode::OK, format!("{account_id}/{event_id}"))
//! }
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register("CreateEvent", create_event);
//! registry.register(
//!     "SendInvitations",
//!     typed(&["accountId", "eventId"], send_invitations),
//! );
//! assert_eq!(registry.len(), 2);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use turnstile_core::{FromBoundParams, RequestContext};
use turnstile_middleware::{BoxFuture, BoxedEndpoint, Endpoint, Request, Response};

use crate::reporter::wiring_failure;

/// Handlers keyed by operation ID.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, BoxedEndpoint>,
    duplicates: Vec<String>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires `handler` to `operation_id`.
    ///
    /// Registering the same ID twice is remembered and rejected when the
    /// dispatcher is built.
    pub fn register<E: Endpoint>(&mut self, operation_id: impl Into<String>, handler: E) {
        self.register_arc(operation_id, Arc::new(handler));
    }

    /// Wires an already-shared handler.
    pub fn register_arc(&mut self, operation_id: impl Into<String>, handler: BoxedEndpoint) {
        let operation_id = operation_id.into();
        if self.handlers.insert(operation_id.clone(), handler).is_some() {
            self.duplicates.push(operation_id);
        }
    }

    /// Returns true if a handler is wired to `operation_id`.
    #[must_use]
    pub fn contains(&self, operation_id: &str) -> bool {
        self.handlers.contains_key(operation_id)
    }

    /// Number of wired operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if nothing is wired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn take(&mut self, operation_id: &str) -> Option<BoxedEndpoint> {
        self.handlers.remove(operation_id)
    }

    pub(crate) fn duplicates(&self) -> &[String] {
        &self.duplicates
    }

    pub(crate) fn remaining_ids(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.handlers.keys().collect();
        ids.sort();
        f.debug_struct("HandlerRegistry")
            .field("operations", &ids)
            .finish_non_exhaustive()
    }
}

/// A handler that receives selected bound parameters as a tuple.
///
/// Created by [`typed`].
pub struct TypedHandler<P, F> {
    names: Vec<String>,
    func: F,
    _params: PhantomData<fn() -> P>,
}

/// Adapts `func` to receive the parameters named in `names`, in order.
///
/// If the bound values don't fit `P` (the contract and the handler
/// disagree), the handler is skipped and `500` is returned.
pub fn typed<P, F, Fut>(names: &[&str], func: F) -> TypedHandler<P, F>
where
    P: FromBoundParams + Send + 'static,
    F: Fn(RequestContext, Request, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    TypedHandler {
        names: names.iter().map(|n| (*n).to_string()).collect(),
        func,
        _params: PhantomData,
    }
}

impl<P, F, Fut> Endpoint for TypedHandler<P, F>
where
    P: FromBoundParams + Send + 'static,
    F: Fn(RequestContext, Request, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: Request) -> BoxFuture<'static, Response> {
        let names: Vec<&str> = self.names.iter().map(String::as_str).collect();
        match P::from_params(ctx.params(), &names) {
            Ok(params) => Box::pin((self.func)(ctx, request, params)),
            Err(mismatch) => {
                tracing::error!(
                    operation_id = ctx.operation_id().unwrap_or_default(),
                    error = %mismatch,
                    "handler parameters do not match the contract"
                );
                Box::pin(async { wiring_failure() })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::{BodyExt, Full};
    use turnstile_core::{BoundParams, BoundValue, ParameterLocation};
    use turnstile_middleware::ResponseExt;

    fn request() -> Request {
        http::Request::builder()
            .uri("/accounts/1/events/2/sendInvitations")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    fn ctx_with_ids() -> RequestContext {
        let mut params = BoundParams::new();
        params.insert("accountId", ParameterLocation::Path, BoundValue::Integer(1));
        params.insert("eventId", ParameterLocation::Path, BoundValue::Integer(2));
        RequestContext::new()
            .with_operation_id("SendInvitations")
            .with_params(params)
    }

    async fn pair(_ctx: RequestContext, _req: Request, (a, e): (i64, i64)) -> Response {
        Response::text(StatusCode::OK, format!("{a}:{e}"))
    }

    #[tokio::test]
    async fn test_typed_handler_receives_tuple() {
        let handler = typed(&["accountId", "eventId"], pair);
        let response = handler.call(ctx_with_ids(), request()).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("1:2"));
    }

    #[tokio::test]
    async fn test_typed_handler_mismatch_is_500() {
        let handler = typed(&["accountId", "missing"], pair);
        let response = handler.call(ctx_with_ids(), request()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_registry_tracks_duplicates() {
        let mut registry = HandlerRegistry::new();
        let ok = |_ctx: RequestContext, _req: Request| async {
            Response::text(StatusCode::OK, "ok")
        };
        registry.register("CreateEvent", ok);
        registry.register("CreateEvent", ok);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.duplicates(), ["CreateEvent".to_string()]);
        assert!(registry.contains("CreateEvent"));
        assert!(format!("{registry:?}").contains("CreateEvent"));
    }
}
