// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Upsert call input and per-entity outcomes.

use super::record::RemoteRecord;
use crate::entity::EntityStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error code the remote system reports for unique-value conflicts.
pub const DUPLICATE_VALUE: &str = "DUPLICATE_VALUE";

/// Field name to value, exactly as it will be written.
pub type FieldValues = Map<String, Value>;

/// One batched upsert: the payload per entity for a single object type.
#[derive(Debug, Clone, Default)]
pub struct UpsertRequest {
    pub object_type: String,
    pub payloads: EntityStore<FieldValues>,
}

impl UpsertRequest {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            payloads: EntityStore::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.payloads.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: String,
    pub message: String,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Remote verdict for one entity of an upsert batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub success: bool,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub waiting: bool,
    #[serde(default)]
    pub record: Option<RemoteRecord>,
    #[serde(default)]
    pub errors: Vec<RemoteError>,
}

impl UpsertOutcome {
    pub fn succeeded(record: RemoteRecord) -> Self {
        Self {
            success: true,
            record: Some(record),
            ..Default::default()
        }
    }

    pub fn failed(errors: Vec<RemoteError>) -> Self {
        Self {
            errors,
            ..Default::default()
        }
    }

    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }

    pub fn waiting() -> Self {
        Self {
            waiting: true,
            ..Default::default()
        }
    }

    pub fn has_error_code(&self, code: &str) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// All error messages joined, or `None` when there are none.
    pub fn message(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        Some(
            self.errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}

/// Identity-keyed outcomes of one upsert call.
pub type UpsertResponse = EntityStore<UpsertOutcome>;
