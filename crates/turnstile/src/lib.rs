//! # Turnstile
//!
//! **Contract-driven HTTP routing and parameter binding**
//!
//! Turnstile takes a declarative contract (operations with a method, a path
//! template, typed parameter descriptors and security requirements) and
//! turns it into a dispatcher that:
//!
//! - matches the request to exactly one operation
//! - binds path, query, header, cookie and multipart parameters in a fixed
//!   order, stopping at the first failure
//! - records the operation's security scopes on the request context
//! - runs global then per-route middleware around the handler
//! - hands routing and binding failures to a single error reporter
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use turnstile::checkin::{self, StubCheckin};
//! use turnstile::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let dispatcher = checkin::register_checkin(
//!         Dispatcher::builder(checkin::contract()),
//!         StubCheckin,
//!     )
//!     .base_path("/api")
//!     .build()?;
//!
//!     Server::new(ServerConfig::default(), Arc::new(dispatcher)).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! Request → Route Table → Binder → Scopes → Middleware → Handler
//!              │            │
//!              └── miss ────┴── failure ──→ Error Reporter
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod checkin;
pub mod service;

// Contract model, bound values, errors, request context
pub use turnstile_core as core;

// Dispatcher, reporters, HTTP transport
pub use turnstile_server as server;

// Middleware chain
pub use turnstile_middleware as middleware;

// Route table
pub use turnstile_router as router;

// Parameter binder
pub use turnstile_extract as extract;

// Layered configuration
pub use turnstile_config as config;

// Logging setup
pub use turnstile_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use turnstile::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    pub use turnstile_core::{
        BindingError, BoundParams, BoundValue, Contract, ContractError, DispatchError, ErrorKind,
        OperationSpec, ParamType, ParameterDescriptor, ParameterLocation, ParameterStyle,
        RequestContext, SecurityRequirement, UploadedFile,
    };

    pub use turnstile_middleware::{
        FnMiddleware, Middleware, Next, Request, Response, ResponseExt,
    };
    pub use turnstile_middleware::stages::{RequestIdMiddleware, TracingMiddleware};

    pub use turnstile_server::{
        reporter_fn, typed, DefaultReporter, Dispatcher, DispatcherBuilder, ErrorReporter,
        JsonErrorReporter, Server, ServerConfig, ShutdownSignal,
    };

    pub use turnstile_config::{load_contract, ConfigLoader, TurnstileConfig};
}
