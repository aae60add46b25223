//! Execution tracing and registry statistics.
//!
//! Every middleware invocation in a chain gets one record. The record's
//! slot is reserved when the middleware starts, so records appear in the
//! order middleware were entered, which is always chain order. Elapsed time is filled in when the
//! middleware completes or fails.
//!
//! Recording never influences control flow. Whether the records end up in
//! the [`ExecutionEnvelope`](crate::ExecutionEnvelope) is decided by the
//! engine's `enable_trace` option.

use laminar_telemetry::metrics::{self as telemetry_metrics, Outcome};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Suffix appended to the name of a trace entry whose middleware failed.
pub const FAILED_SUFFIX: &str = " (failed)";

/// One middleware invocation as seen by the tracer.
///
/// # Example
///
/// ```
/// use laminar_middleware::TraceEntry;
///
/// let entry = TraceEntry {
///     name: "auth (failed)".to_string(),
///     execution_time_ms: 0.4,
///     order: 0,
/// };
/// assert!(entry.failed());
/// assert_eq!(entry.middleware_id(), "auth");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    /// Middleware id, suffixed with `" (failed)"` if it failed.
    pub name: String,
    /// Wall-clock time spent inside the middleware, including everything it
    /// awaited downstream.
    pub execution_time_ms: f64,
    /// The chain position the middleware occupied.
    pub order: usize,
}

impl TraceEntry {
    /// Returns true if the middleware failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.name.ends_with(FAILED_SUFFIX)
    }

    /// Returns the middleware id without the failure suffix.
    #[must_use]
    pub fn middleware_id(&self) -> &str {
        self.name.strip_suffix(FAILED_SUFFIX).unwrap_or(&self.name)
    }
}

/// Static counts over the registered entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Number of registered entries.
    pub total: usize,
    /// Entries applied to every execution.
    pub global: usize,
    /// Entries applied only when targeted.
    pub specific: usize,
}

impl RegistryStats {
    /// Counts entries given their `global` flags.
    pub(crate) fn collect(globals: impl IntoIterator<Item = bool>) -> Self {
        globals
            .into_iter()
            .fold(Self::default(), |mut stats, global| {
                stats.total += 1;
                if global {
                    stats.global += 1;
                } else {
                    stats.specific += 1;
                }
                stats
            })
    }
}

#[derive(Debug)]
struct Record {
    id: String,
    order: usize,
    started_at: Instant,
    elapsed: Option<Duration>,
    outcome: Option<Outcome>,
}

impl Record {
    fn to_entry(&self) -> TraceEntry {
        // A record that never finished was cancelled, e.g. by a timeout upstream
        let name = match self.outcome {
            Some(Outcome::Completed) => self.id.clone(),
            Some(Outcome::Failed) | None => format!("{}{FAILED_SUFFIX}", self.id),
        };
        let elapsed = self
            .elapsed
            .unwrap_or_else(|| self.started_at.elapsed());

        TraceEntry {
            name,
            execution_time_ms: duration_ms(elapsed),
            order: self.order,
        }
    }
}

/// Collects the records of one chain invocation.
#[derive(Debug, Default)]
pub(crate) struct TraceRecorder {
    records: Mutex<Vec<Record>>,
}

impl TraceRecorder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Reserves a record for a middleware that is about to run.
    pub(crate) fn start(&self, id: &str, order: usize) -> usize {
        let mut records = self.records.lock();
        records.push(Record {
            id: id.to_string(),
            order,
            started_at: Instant::now(),
            elapsed: None,
            outcome: None,
        });
        records.len() - 1
    }

    pub(crate) fn complete(&self, slot: usize) {
        self.finish(slot, Outcome::Completed);
    }

    pub(crate) fn fail(&self, slot: usize) {
        self.finish(slot, Outcome::Failed);
    }

    fn finish(&self, slot: usize, outcome: Outcome) {
        let mut records = self.records.lock();
        if let Some(record) = records.get_mut(slot) {
            let elapsed = record.started_at.elapsed();
            record.elapsed = Some(elapsed);
            record.outcome = Some(outcome);
            telemetry_metrics::record_middleware(&record.id, outcome, elapsed);
        }
    }

    /// Consumes the recorder, returning entries in slot order.
    pub(crate) fn into_entries(self) -> Vec<TraceEntry> {
        self.records.into_inner().iter().map(Record::to_entry).collect()
    }
}

/// Converts a duration to fractional milliseconds.
pub(crate) fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
