// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for payload construction and the upsert call.
//!
//! Field-level notices are `info!`: they explain why a value the mapping
//! produced never reached the remote system. Date coercion problems are
//! `debug!` because malformed dates are routine in imported data.

use crate::entity::EntityId;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Why a mapped field was left out of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotCreatable,
    NotUpdateable,
    UnknownField,
}

impl Display for DropReason {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let text = match self {
            DropReason::NotCreatable => "field is not creatable",
            DropReason::NotUpdateable => "field is not updateable",
            DropReason::UnknownField => "field is not described by the remote object",
        };
        f.write_str(text)
    }
}

/// A mapped field was dropped from an entity's payload.
///
/// # Log Level
/// `info!` - Notice
///
/// # Example
/// ```
/// use entity_sync::entity::EntityId;
/// use entity_sync::observability::messages::upsert::{DropReason, FieldDropped};
///
/// let msg = FieldDropped {
///     entity: EntityId(7),
///     field: "CreatedDate",
///     reason: DropReason::NotCreatable,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Dropping 'CreatedDate' for entity #7: field is not creatable"
/// );
/// ```
pub struct FieldDropped<'a> {
    pub entity: EntityId,
    pub field: &'a str,
    pub reason: DropReason,
}

impl Display for FieldDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropping '{}' for entity {}: {}",
            self.field, self.entity, self.reason
        )
    }
}

impl StructuredLog for FieldDropped<'_> {
    fn log(&self) {
        tracing::info!(
            entity = %self.entity,
            field = self.field,
            reason = %self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "field_dropped",
            span_name = name,
            entity = %self.entity,
            field = self.field,
        )
    }
}

/// A text value was shortened to the field's length.
///
/// # Log Level
/// `info!` - Notice
pub struct ValueTruncated<'a> {
    pub entity: EntityId,
    pub field: &'a str,
    pub original_length: usize,
    pub max_length: usize,
}

impl Display for ValueTruncated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Truncated '{}' for entity {} from {} to {} characters",
            self.field, self.entity, self.original_length, self.max_length
        )
    }
}

impl StructuredLog for ValueTruncated<'_> {
    fn log(&self) {
        tracing::info!(
            entity = %self.entity,
            field = self.field,
            original_length = self.original_length,
            max_length = self.max_length,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "value_truncated",
            span_name = name,
            entity = %self.entity,
            field = self.field,
        )
    }
}

/// A date/datetime value could not be used.
///
/// # Log Level
/// `debug!` - Absorbed input problem
pub struct DateDropped<'a> {
    pub entity: EntityId,
    pub field: &'a str,
    pub value: &'a str,
    pub reason: &'a str,
}

impl Display for DateDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropping date '{}' = '{}' for entity {}: {}",
            self.field, self.value, self.entity, self.reason
        )
    }
}

impl StructuredLog for DateDropped<'_> {
    fn log(&self) {
        tracing::debug!(
            entity = %self.entity,
            field = self.field,
            value = self.value,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "date_dropped",
            span_name = name,
            entity = %self.entity,
            field = self.field,
        )
    }
}

/// No payload survived, so the upsert call is not made.
pub struct UpsertSkipped<'a> {
    pub object_type: &'a str,
}

impl Display for UpsertSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Upsert on {} skipped: nothing to send", self.object_type)
    }
}

impl StructuredLog for UpsertSkipped<'_> {
    fn log(&self) {
        tracing::info!(object_type = self.object_type, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "upsert_skipped",
            span_name = name,
            object_type = self.object_type,
        )
    }
}

/// Summary of one upsert call.
///
/// # Log Level
/// `info!` - Important operational event
pub struct UpsertCompleted<'a> {
    pub object_type: &'a str,
    pub sent: usize,
    pub succeeded: usize,
    pub up_to_date: usize,
}

impl Display for UpsertCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Upserted {} {} records: {} succeeded, {} already up to date",
            self.sent, self.object_type, self.succeeded, self.up_to_date
        )
    }
}

impl StructuredLog for UpsertCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            object_type = self.object_type,
            sent = self.sent,
            succeeded = self.succeeded,
            up_to_date = self.up_to_date,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "upsert",
            span_name = name,
            object_type = self.object_type,
            sent = self.sent,
        )
    }
}
