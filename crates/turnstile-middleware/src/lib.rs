//! # Turnstile Middleware
//!
//! Composable request interceptors for the Turnstile HTTP layer.
//!
//! Middleware wraps the handler call of a route. Each route's chain (the
//! global middleware followed by the route's own) is composed once when
//! the route is registered and applied identically to every request that
//! matches it:
//!
//! ```text
//! Request → A.pre → B.pre → handler
//!                              ↓
//! Response ← A.post ← B.post ←┘
//! ```
//!
//! Middleware runs only after routing and parameter binding succeeded;
//! routing and binding failures are reported before any middleware sees
//! the request.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use turnstile_middleware::{Chain, Request, Response, ResponseExt};
//! use turnstile_middleware::stages::{RequestIdMiddleware, TracingMiddleware};
//! use turnstile_core::RequestContext;
//! use http::StatusCode;
//!
//! async fn create_event(_ctx: RequestContext, _req: Request) -> Response {
//!     Response::text(StatusCode::OK, "CreateEvent")
//! }
//!
//! let chain = Chain::new(
//!     vec![
//!         Arc::new(RequestIdMiddleware::new()),
//!         Arc::new(TracingMiddleware::new("checkin")),
//!     ],
//!     Arc::new(create_event),
//! );
//! assert_eq!(chain.names(), vec!["request_id", "tracing"]);
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod middleware;
pub mod stages;
pub mod types;

// Re-export main types at crate root
pub use chain::{BoxedEndpoint, BoxedMiddleware, Chain};
pub use middleware::{BoxFuture, Endpoint, FnMiddleware, Middleware, Next};
pub use types::{Request, Response, ResponseExt};
