//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that interceptors implement
//! and the [`Endpoint`] trait for the terminal handler call. Middleware sees
//! the request after routing and binding succeeded, so the
//! [`RequestContext`] already carries the operation ID, the bound parameters
//! and the required scopes.
//!
//! # Example
//!
//! ```rust
//! use turnstile_middleware::{BoxFuture, Middleware, Next, Request, Response};
//! use turnstile_core::RequestContext;
//!
//! struct LoggingMiddleware;
//!
//! impl Middleware for LoggingMiddleware {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         ctx: &'a mut RequestContext,
//!         request: Request,
//!         next: Next<'a>,
//!     ) -> BoxFuture<'a, Response> {
//!         Box::pin(async move {
//!             tracing::debug!(request_id = %ctx.request_id(), "before handler");
//!             let response = next.run(ctx, request).await;
//!             tracing::debug!(status = %response.status(), "after handler");
//!             response
//!         })
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use turnstile_core::RequestContext;

use crate::types::{Request, Response};

/// A boxed future that returns a response.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A request interceptor.
///
/// Middleware receives the mutable request context, the request, and a
/// [`Next`] to continue the chain. It may act before and after calling
/// `next.run()`, or return its own response without calling it.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    /// Process the request through this middleware.
    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response>;
}

/// The terminal unit of a chain: the handler call.
///
/// The handler receives its own copy of the context; changes it makes are
/// not visible to middleware on the way out.
pub trait Endpoint: Send + Sync + 'static {
    /// Invokes the handler.
    fn call(&self, ctx: RequestContext, request: Request) -> BoxFuture<'static, Response>;
}

impl<F, Fut> Endpoint for F
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn call(&self, ctx: RequestContext, request: Request) -> BoxFuture<'static, Response> {
        Box::pin(self(ctx, request))
    }
}

/// Callback to invoke the rest of the chain.
///
/// A cursor over the middleware still ahead of the caller and the endpoint
/// behind them. Consumed by [`Next::run`], so it can be called at most once.
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    /// Creates a `Next` that runs `middleware` in order, then `endpoint`.
    pub(crate) fn new(middleware: &'a [Arc<dyn Middleware>], endpoint: &'a dyn Endpoint) -> Self {
        Self {
            middleware,
            endpoint,
        }
    }

    /// Middleware left before the endpoint is reached.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.middleware.len()
    }

    /// Invokes the next middleware or the handler.
    pub async fn run(self, ctx: &mut RequestContext, request: Request) -> Response {
        match self.middleware.split_first() {
            Some((middleware, rest)) => {
                let next = Next::new(rest, self.endpoint);
                middleware.process(ctx, request, next).await
            }
            None => self.endpoint.call(ctx.clone(), request).await,
        }
    }
}

/// Middleware built from a closure.
///
/// # Example
///
/// ```rust
/// use turnstile_middleware::FnMiddleware;
///
/// let timing = FnMiddleware::new("timing", |ctx, req, next| {
///     Box::pin(async move {
///         let response = next.run(ctx, req).await;
///         tracing::debug!(elapsed = ?ctx.elapsed(), "handled");
///         response
///     })
/// });
/// # let _ = timing;
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new function-based middleware.
    pub const fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Request, Next<'a>) -> BoxFuture<'a, Response>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        request: Request,
        next: Next<'a>,
    ) -> BoxFuture<'a, Response> {
        (self.func)(ctx, request, next)
    }
}
