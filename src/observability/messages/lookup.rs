// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the remote query and record matching.

use crate::entity::EntityId;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The lookup query is about to be sent.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use entity_sync::observability::messages::lookup::QueryRequested;
///
/// let msg = QueryRequested {
///     object_type: "Account",
///     entity_count: 3,
///     query: "SELECT Id FROM Account WHERE Name = 'Acme'",
/// };
///
/// assert!(msg.to_string().starts_with("Querying Account for 3 entities"));
/// ```
pub struct QueryRequested<'a> {
    pub object_type: &'a str,
    pub entity_count: usize,
    pub query: &'a str,
}

impl Display for QueryRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Querying {} for {} entities: {}",
            self.object_type, self.entity_count, self.query
        )
    }
}

impl StructuredLog for QueryRequested<'_> {
    fn log(&self) {
        tracing::info!(
            object_type = self.object_type,
            entity_count = self.entity_count,
            query = self.query,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "lookup_query",
            span_name = name,
            object_type = self.object_type,
            entity_count = self.entity_count,
        )
    }
}

/// The lookup query returned.
///
/// # Log Level
/// `info!` - Important operational event
pub struct QueryCompleted<'a> {
    pub object_type: &'a str,
    pub record_count: usize,
}

impl Display for QueryCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Query on {} returned {} records",
            self.object_type, self.record_count
        )
    }
}

impl StructuredLog for QueryCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            object_type = self.object_type,
            record_count = self.record_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "lookup_query_completed",
            span_name = name,
            object_type = self.object_type,
            record_count = self.record_count,
        )
    }
}

/// Nothing to look up: every entity was skipped.
///
/// # Log Level
/// `info!` - Important operational event
pub struct LookupSkipped<'a> {
    pub object_type: &'a str,
}

impl Display for LookupSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Lookup on {} skipped: query is empty", self.object_type)
    }
}

impl StructuredLog for LookupSkipped<'_> {
    fn log(&self) {
        tracing::info!(object_type = self.object_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "lookup_skipped",
            span_name = name,
            object_type = self.object_type,
        )
    }
}

/// Columns added so the upsert can compare against fetched values.
pub struct MappingFieldsSelected<'a> {
    pub object_type: &'a str,
    pub columns: &'a [String],
}

impl Display for MappingFieldsSelected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Selecting {} mapped fields on {}: {}",
            self.columns.len(),
            self.object_type,
            self.columns.join(", ")
        )
    }
}

impl StructuredLog for MappingFieldsSelected<'_> {
    fn log(&self) {
        tracing::debug!(
            object_type = self.object_type,
            column_count = self.columns.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "mapping_fields_selected",
            span_name = name,
            object_type = self.object_type,
        )
    }
}

/// Best match chosen for an entity.
///
/// # Log Level
/// `debug!` - Per-entity detail
pub struct RecordMatched<'a> {
    pub entity: EntityId,
    pub record_id: &'a str,
    pub priority: u32,
    pub candidates: usize,
}

impl Display for RecordMatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Entity {} matched remote record {} at priority {} ({} candidates)",
            self.entity, self.record_id, self.priority, self.candidates
        )
    }
}

impl StructuredLog for RecordMatched<'_> {
    fn log(&self) {
        tracing::debug!(
            entity = %self.entity,
            record_id = self.record_id,
            priority = self.priority,
            candidates = self.candidates,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "record_matched",
            span_name = name,
            entity = %self.entity,
            record_id = self.record_id,
        )
    }
}

pub struct RecordNotFound {
    pub entity: EntityId,
}

impl Display for RecordNotFound {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "No remote record found for entity {}", self.entity)
    }
}

impl StructuredLog for RecordNotFound {
    fn log(&self) {
        tracing::debug!(entity = %self.entity, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("record_not_found", span_name = name, entity = %self.entity)
    }
}
