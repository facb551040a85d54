// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for unit graph runs and the unit lifecycle.

use crate::engine::UnitStatus;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A graph run started for a root unit.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use entity_sync::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     root: "status",
///     unit_count: 6,
/// };
///
/// assert_eq!(msg.to_string(), "Running unit graph for 'status': 6 units planned");
/// ```
pub struct RunStarted<'a> {
    pub root: &'a str,
    pub unit_count: usize,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Running unit graph for '{}': {} units planned",
            self.root, self.unit_count
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(root = self.root, unit_count = self.unit_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_run",
            span_name = name,
            root = self.root,
            unit_count = self.unit_count,
        )
    }
}

/// A graph run finished.
///
/// # Log Level
/// `info!` - Important operational event
pub struct RunCompleted<'a> {
    pub root: &'a str,
    pub duration: Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unit graph for '{}' completed in {:?}", self.root, self.duration)
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            root = self.root,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_run_completed",
            span_name = name,
            root = self.root,
            duration = ?self.duration,
        )
    }
}

/// A unit began processing.
///
/// # Log Level
/// `debug!` - Detailed lifecycle event
pub struct UnitStarted<'a> {
    pub unit: &'a str,
    pub kind: &'a str,
}

impl Display for UnitStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Processing unit '{}' ({})", self.unit, self.kind)
    }
}

impl StructuredLog for UnitStarted<'_> {
    fn log(&self) {
        tracing::debug!(unit = self.unit, kind = self.kind, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("unit", span_name = name, unit = self.unit, kind = self.kind)
    }
}

/// A unit finished successfully.
///
/// # Log Level
/// `debug!` - Detailed lifecycle event
pub struct UnitCompleted<'a> {
    pub unit: &'a str,
    pub kind: &'a str,
    pub duration: Duration,
}

impl Display for UnitCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unit '{}' ({}) completed in {:?}",
            self.unit, self.kind, self.duration
        )
    }
}

impl StructuredLog for UnitCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            unit = self.unit,
            kind = self.kind,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "unit_completed",
            span_name = name,
            unit = self.unit,
            kind = self.kind,
            duration = ?self.duration,
        )
    }
}

/// A unit failed; the run aborts with this error.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct UnitFailed<'a> {
    pub unit: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for UnitFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unit '{}' failed: {}", self.unit, self.error)
    }
}

impl StructuredLog for UnitFailed<'_> {
    fn log(&self) {
        tracing::error!(unit = self.unit, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "unit_failed",
            span_name = name,
            unit = self.unit,
            error = %self.error,
        )
    }
}

/// A finished unit was reached again and not re-run.
pub struct UnitMemoized<'a> {
    pub unit: &'a str,
    pub status: UnitStatus,
}

impl Display for UnitMemoized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unit '{}' already {}, not re-running", self.unit, self.status)
    }
}

impl StructuredLog for UnitMemoized<'_> {
    fn log(&self) {
        tracing::trace!(unit = self.unit, status = %self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "unit_memoized",
            span_name = name,
            unit = self.unit,
            status = %self.status,
        )
    }
}

/// Readers of a unit now see a forced status.
///
/// # Log Level
/// `debug!` - Detailed lifecycle event
pub struct StatusForced<'a> {
    pub unit: &'a str,
    pub status: UnitStatus,
    pub true_status: UnitStatus,
}

impl Display for StatusForced<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Forcing unit '{}' to read as {} (actually {})",
            self.unit, self.status, self.true_status
        )
    }
}

impl StructuredLog for StatusForced<'_> {
    fn log(&self) {
        tracing::debug!(
            unit = self.unit,
            status = %self.status,
            true_status = %self.true_status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "status_forced",
            span_name = name,
            unit = self.unit,
            status = %self.status,
        )
    }
}

pub struct StatusRestored<'a> {
    pub unit: &'a str,
    pub status: UnitStatus,
}

impl Display for StatusRestored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Restored unit '{}' to {}", self.unit, self.status)
    }
}

impl StructuredLog for StatusRestored<'_> {
    fn log(&self) {
        tracing::debug!(unit = self.unit, status = %self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "status_restored",
            span_name = name,
            unit = self.unit,
            status = %self.status,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_render() {
        let error = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        assert_eq!(
            UnitFailed {
                unit: "upsertOutput",
                error: &error
            }
            .to_string(),
            "Unit 'upsertOutput' failed: socket closed"
        );
        assert_eq!(
            StatusForced {
                unit: "lookup",
                status: UnitStatus::Complete,
                true_status: UnitStatus::Processing,
            }
            .to_string(),
            "Forcing unit 'lookup' to read as COMPLETE (actually PROCESSING)"
        );
    }
}
