//! # Turnstile Server
//!
//! Dispatch and transport for Turnstile.
//!
//! - [`Dispatcher`]: matches a request against the contract's routes, binds
//!   its parameters, attaches security scopes and runs the route's
//!   middleware chain and handler
//! - [`ErrorReporter`]: turns routing and binding failures into responses
//! - [`HandlerRegistry`] and [`typed`]: wire handlers to operation IDs
//! - [`Server`]: a hyper HTTP/1.1 transport with graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use turnstile_server::{Dispatcher, JsonErrorReporter};
//! use turnstile_core::{Contract, OperationSpec, ParamType, ParameterDescriptor, RequestContext};
//! use turnstile_middleware::{Request, Response, ResponseExt};
//! use http::{Method, StatusCode};
//!
//! let contract = Contract::new().operation(
//!     OperationSpec::new("SendInvitations", &Method::POST, "/accounts/{accountId}/events/{eventId}/sendInvitations")
//!         .param(ParameterDescriptor::path("accountId", ParamType::INTEGER))
//!         .param(ParameterDescriptor::path("eventId", ParamType::INTEGER)),
//! );
//!
//! let dispatcher = Dispatcher::builder(contract)
//!     .handler("SendInvitations", |_ctx: RequestContext, _req: Request| async {
//!         Response::text(StatusCode::OK, "SendInvitations")
//!     })
//!     .reporter(JsonErrorReporter)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(dispatcher.routes().len(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod dispatcher;
pub mod handler;
pub mod reporter;
pub mod server;
pub mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use dispatcher::{DispatchOutcome, Dispatcher, DispatcherBuilder, Route};
pub use handler::{typed, HandlerRegistry, TypedHandler};
pub use reporter::{reporter_fn, DefaultReporter, ErrorReporter, FnReporter, JsonErrorReporter};
pub use server::{Server, ServerError};
pub use shutdown::ShutdownSignal;
