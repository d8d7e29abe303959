//! Session diagnostics: timing, shape counts and status for each editor
//! operation.
//!
//! The engine never reads a clock itself. Callers supply a [`Clock`] so the
//! same code runs wherever `std::time::Instant` is unavailable.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::editor::{Operation, Outcome};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Run `f`, returning its result and how long it took.
pub fn measure<C: Clock, T>(clock: &C, f: impl FnOnce() -> T) -> (T, Duration) {
    let start = clock.now();
    let value = f();
    (value, clock.elapsed(&start))
}

/// Diagnostics for one editor operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationDiagnostics {
    pub operation: Operation,
    /// Wall-clock duration of the operation (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    pub shapes_before: usize,
    pub shapes_after: usize,
    /// Change count reported by the operation.
    pub changed: usize,
    pub status: String,
}

impl OperationDiagnostics {
    /// Diagnostics for an outcome, given the scene size around it.
    #[must_use]
    pub fn new(outcome: &Outcome, duration: Duration, shapes_before: usize, shapes_after: usize) -> Self {
        Self {
            operation: outcome.operation,
            duration,
            shapes_before,
            shapes_after,
            changed: outcome.changed,
            status: outcome.status.clone(),
        }
    }
}

/// Diagnostics for a sequence of operations on one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDiagnostics {
    /// Document name, when known.
    pub source: Option<String>,
    pub operations: Vec<OperationDiagnostics>,
}

impl SessionDiagnostics {
    #[must_use]
    pub fn new(source: Option<String>) -> Self {
        Self {
            source,
            operations: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostics: OperationDiagnostics) {
        self.operations.push(diagnostics);
    }

    /// Sum of every operation's duration.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.operations.iter().map(|o| o.duration).sum()
    }

    /// Sum of every operation's change count.
    #[must_use]
    pub fn total_changed(&self) -> usize {
        self.operations.iter().map(|o| o.changed).sum()
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Despeck Session Report\n{}", "=".repeat(60)));
        if let Some(source) = &self.source {
            lines.push(format!("Source: {source}"));
        }
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration()),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<12} {:>10} {:>8} {:>8} {:>8}  {}",
            "Operation", "Duration", "Before", "After", "Changed", "Status"
        ));
        lines.push("-".repeat(80));

        for op in &self.operations {
            let ms = duration_ms(op.duration);
            lines.push(format!(
                "{:<12} {ms:>8.3}ms {:>8} {:>8} {:>8}  {}",
                op.operation.label(),
                op.shapes_before,
                op.shapes_after,
                op.changed,
                op.status,
            ));
        }

        lines.push(String::new());
        lines.push(format!(
            "Operations: {}  |  Total changes: {}",
            self.operations.len(),
            self.total_changed(),
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
