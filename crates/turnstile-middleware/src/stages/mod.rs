//! Ready-made middleware.
//!
//! - [`request_id`] - propagate or echo the request ID
//! - [`trace`] - one `tracing` span per dispatched request

pub mod request_id;
pub mod trace;

pub use request_id::RequestIdMiddleware;
pub use trace::TracingMiddleware;
