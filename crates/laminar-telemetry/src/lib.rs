//! Observability conventions for Laminar.
//!
//! This crate provides the logging and metrics plumbing shared by the
//! Laminar crates:
//!
//! - **Logging**: structured logs through `tracing` with a `tracing-subscriber`
//!   registry, JSON for production and pretty output for development
//! - **Metrics**: standard metric names and recording helpers on top of the
//!   `metrics` facade; the host application installs whichever recorder it
//!   wants (Prometheus, StatsD, ...)
//!
//! # Standard Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `laminar_executions_total` | Counter | `outcome` | Chain executions |
//! | `laminar_execution_duration_seconds` | Histogram | - | Whole-chain latency |
//! | `laminar_middleware_executions_total` | Counter | `middleware`, `outcome` | Middleware invocations |
//! | `laminar_middleware_duration_seconds` | Histogram | `middleware` | Per-middleware latency |
//! | `laminar_unknown_targets_total` | Counter | - | Target ids that were not registered |
//!
//! # Example
//!
//! ```rust,ignore
//! use laminar_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//! tracing::info!(middleware = "auth", "registered");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use crate::error::TelemetryError;
pub use crate::logging::{create_env_filter, init_logging, LogConfig};
pub use crate::metrics::{describe_metrics, Outcome};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
