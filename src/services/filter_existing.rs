// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Queue preparation helper for callers that build sync queues.
//!
//! [`FilterExisting`] is not a pipeline unit. A caller holding raw queue rows
//! (customer groups, customers) runs it before enqueueing, so rows whose
//! local key already maps to a remote id in the target scope are never
//! queued again.
//!
//! ```
//! use entity_sync::entity::ScopeId;
//! use entity_sync::services::FilterExisting;
//! use entity_sync::traits::MappedIdSource;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Synced;
//!
//! impl MappedIdSource for Synced {
//!     fn mapped_id(&self, key: u64, _scope: ScopeId) -> Option<String> {
//!         (key == 1).then(|| "00G000000000001".to_string())
//!     }
//! }
//!
//! let rows = vec![
//!     json!({ "customer_group_id": 1 }).as_object().unwrap().clone(),
//!     json!({ "customer_group_id": 2 }).as_object().unwrap().clone(),
//! ];
//! let pending = FilterExisting::new(Arc::new(Synced)).execute(rows, ScopeId(0));
//! assert_eq!(pending.len(), 1);
//! assert_eq!(pending[0]["customer_group_id"], 2);
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::entity::ScopeId;
use crate::traits::MappedIdSource;

/// Row attributes that carry the local key, in precedence order.
const KEY_ATTRIBUTES: [&str; 3] = ["group_id", "customer_group_id", "entity_id"];

/// Local key of a queue row, `None` when the row carries none.
pub fn row_key(row: &Map<String, Value>) -> Option<u64> {
    KEY_ATTRIBUTES
        .iter()
        .filter_map(|attribute| row.get(*attribute))
        .find(|value| !value.is_null())
        .and_then(|value| match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
}

/// Drops queue rows that already have a remote counterpart in a scope.
pub struct FilterExisting {
    source: Arc<dyn MappedIdSource>,
}

impl FilterExisting {
    pub fn new(source: Arc<dyn MappedIdSource>) -> Self {
        Self { source }
    }

    /// Rows without a key are dropped. Survivors come back grouped by key in
    /// ascending key order, rows sharing a key in their original order.
    pub fn execute(
        &self,
        rows: Vec<Map<String, Value>>,
        scope: ScopeId,
    ) -> Vec<Map<String, Value>> {
        let mut grouped: BTreeMap<u64, Vec<Map<String, Value>>> = BTreeMap::new();
        for row in rows {
            if let Some(key) = row_key(&row) {
                grouped.entry(key).or_default().push(row);
            }
        }

        grouped
            .into_iter()
            .filter(|(key, _)| {
                self.source
                    .mapped_id(*key, scope)
                    .map_or(true, |id| id.trim().is_empty())
            })
            .flat_map(|(_, rows)| rows)
            .collect()
    }
}
