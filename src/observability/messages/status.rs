// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for status reconciliation.

use crate::entity::EntityId;
use crate::observability::messages::StructuredLog;
use crate::units::status::SyncStatus;
use std::fmt::{Display, Formatter};
use tracing::Span;

pub struct StatusResolved<'a> {
    pub entity: EntityId,
    pub status: SyncStatus,
    pub message: &'a str,
}

impl Display for StatusResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "Entity {} resolved to {}", self.entity, self.status)
        } else {
            write!(
                f,
                "Entity {} resolved to {}: {}",
                self.entity, self.status, self.message
            )
        }
    }
}

impl StructuredLog for StatusResolved<'_> {
    fn log(&self) {
        tracing::debug!(entity = %self.entity, status = %self.status, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "status_resolved",
            span_name = name,
            entity = %self.entity,
            status = %self.status,
        )
    }
}

/// A duplicate received its representative's status.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DuplicatePropagated {
    pub entity: EntityId,
    pub duplicate: EntityId,
    pub status: SyncStatus,
}

impl Display for DuplicatePropagated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Propagated {} from entity {} to duplicate {}",
            self.status, self.entity, self.duplicate
        )
    }
}

impl StructuredLog for DuplicatePropagated {
    fn log(&self) {
        tracing::info!(
            entity = %self.entity,
            duplicate = %self.duplicate,
            status = %self.status,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "duplicate_propagated",
            span_name = name,
            entity = %self.entity,
            duplicate = %self.duplicate,
        )
    }
}

/// Persisting a status failed. The run continues.
///
/// # Log Level
/// `warn!` - Degraded but recoverable
pub struct StatusPersistFailed<'a> {
    pub entity: EntityId,
    pub sink: &'a str,
    pub error: &'a dyn Display,
}

impl Display for StatusPersistFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to write status of entity {} to {}: {}",
            self.entity, self.sink, self.error
        )
    }
}

impl StructuredLog for StatusPersistFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            entity = %self.entity,
            sink = self.sink,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "status_persist_failed",
            span_name = name,
            entity = %self.entity,
            sink = self.sink,
        )
    }
}
