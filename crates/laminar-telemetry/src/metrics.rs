//! Metric names and recording helpers.
//!
//! Recording goes through the `metrics` facade. Without an installed
//! recorder every call here is a no-op, so the engine records
//! unconditionally and leaves exporter choice to the host.
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `laminar_executions_total` | Counter | `outcome` |
//! | `laminar_execution_duration_seconds` | Histogram | - |
//! | `laminar_middleware_executions_total` | Counter | `middleware`, `outcome` |
//! | `laminar_middleware_duration_seconds` | Histogram | `middleware` |
//! | `laminar_unknown_targets_total` | Counter | - |

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::fmt;
use std::time::Duration;

/// Metric names used by the engine.
pub mod names {
    /// Counter of whole-chain executions.
    pub const EXECUTIONS_TOTAL: &str = "laminar_executions_total";

    /// Histogram of whole-chain latency.
    pub const EXECUTION_DURATION_SECONDS: &str = "laminar_execution_duration_seconds";

    /// Counter of individual middleware invocations.
    pub const MIDDLEWARE_EXECUTIONS_TOTAL: &str = "laminar_middleware_executions_total";

    /// Histogram of individual middleware latency.
    pub const MIDDLEWARE_DURATION_SECONDS: &str = "laminar_middleware_duration_seconds";

    /// Counter of requested target ids that were not registered.
    pub const UNKNOWN_TARGETS_TOTAL: &str = "laminar_unknown_targets_total";
}

/// How an execution or a single middleware invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Completed and produced a result.
    Completed,
    /// Failed; the error was either propagated or swallowed.
    Failed,
}

impl Outcome {
    /// Returns the label value for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registers descriptions for all standard metrics with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        names::EXECUTIONS_TOTAL,
        Unit::Count,
        "Total number of middleware chain executions"
    );
    describe_histogram!(
        names::EXECUTION_DURATION_SECONDS,
        Unit::Seconds,
        "Middleware chain execution duration"
    );
    describe_counter!(
        names::MIDDLEWARE_EXECUTIONS_TOTAL,
        Unit::Count,
        "Total number of individual middleware invocations"
    );
    describe_histogram!(
        names::MIDDLEWARE_DURATION_SECONDS,
        Unit::Seconds,
        "Individual middleware invocation duration"
    );
    describe_counter!(
        names::UNKNOWN_TARGETS_TOTAL,
        Unit::Count,
        "Requested middleware ids that were not registered"
    );
}

/// Records one finished chain execution.
pub fn record_execution(outcome: Outcome, duration: Duration) {
    counter!(names::EXECUTIONS_TOTAL, "outcome" => outcome.as_str()).increment(1);
    histogram!(names::EXECUTION_DURATION_SECONDS).record(duration.as_secs_f64());
}

/// Records one finished middleware invocation.
pub fn record_middleware(middleware: &str, outcome: Outcome, duration: Duration) {
    counter!(
        names::MIDDLEWARE_EXECUTIONS_TOTAL,
        "middleware" => middleware.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!(
        names::MIDDLEWARE_DURATION_SECONDS,
        "middleware" => middleware.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a requested target id that was not registered.
pub fn record_unknown_target() {
    counter!(names::UNKNOWN_TARGETS_TOTAL).increment(1);
}
