//! Observability setup for Turnstile.
//!
//! - [`init_logging`] installs a `tracing` subscriber, JSON or pretty,
//!   filtered by an `EnvFilter` directive
//! - [`fields`] names the structured fields used across dispatch logs
//! - [`metrics`] names and describes the dispatcher's metrics
//!
//! # Example
//!
//! ```rust,no_run
//! use turnstile_telemetry::{describe_metrics, init_logging, LogConfig, LogFormat};
//!
//! let config = LogConfig::production().with_format(LogFormat::Pretty);
//! init_logging(&config).unwrap();
//! describe_metrics();
//! ```

#![doc(html_root_url = "https://docs.rs/turnstile-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, LogConfig, LogFormat};
pub use crate::metrics::describe_metrics;

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
