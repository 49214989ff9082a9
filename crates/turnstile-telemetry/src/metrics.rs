//! Metric names and descriptions.
//!
//! The dispatcher records through the `metrics` facade; installing an
//! exporter is up to the embedding process. Call [`describe_metrics`] after
//! installing a recorder so exporters can publish help text and units.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `turnstile_dispatch_total` | Counter | `operation`, `outcome` |
//! | `turnstile_dispatch_duration_seconds` | Histogram | `operation` |

use ::metrics::{describe_counter, describe_histogram, Unit};

/// Dispatches by operation and outcome.
pub const DISPATCH_TOTAL: &str = "turnstile_dispatch_total";

/// Dispatch latency, matching through handler completion.
pub const DISPATCH_DURATION_SECONDS: &str = "turnstile_dispatch_duration_seconds";

/// Outcome label values.
pub mod outcome {
    /// No route matched.
    pub const NOT_FOUND: &str = "not_found";
    /// A parameter failed to bind.
    pub const BINDING_FAILED: &str = "binding_failed";
    /// Cancelled during binding.
    pub const CANCELLED: &str = "cancelled";
    /// Handler ran.
    pub const COMPLETED: &str = "completed";
}

/// Registers descriptions for the dispatcher's metrics with the installed
/// recorder.
pub fn describe_metrics() {
    describe_counter!(
        DISPATCH_TOTAL,
        Unit::Count,
        "Requests dispatched, by operation and outcome"
    );
    describe_histogram!(
        DISPATCH_DURATION_SECONDS,
        Unit::Seconds,
        "Time from route matching to the response, by operation"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(DISPATCH_TOTAL, "turnstile_dispatch_total");
        assert!(DISPATCH_DURATION_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn test_describe_without_recorder_is_noop() {
        describe_metrics();
    }
}
