// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the remote identifier field.
pub const ID_FIELD: &str = "Id";

/// A single remote record: field name to value, nested relations as objects.
///
/// Remote field names are case-insensitive, so lookups fall back to a
/// case-insensitive scan when the exact key is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteRecord(pub Map<String, Value>);

impl RemoteRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.get(ID_FIELD)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(field) {
            return Some(value);
        }
        self.0
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    }

    /// Resolve a dotted path such as `Account.OwnerId` through nested records.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            let nested = current.as_object()?;
            current = match nested.get(segment) {
                Some(value) => value,
                None => {
                    nested
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(segment))?
                        .1
                }
            };
        }
        Some(current)
    }

    /// Nested relation as its own record (e.g. the `Account` of a `Contact`).
    pub fn sub_record(&self, relation: &str) -> Option<RemoteRecord> {
        self.get(relation)
            .and_then(Value::as_object)
            .map(|fields| RemoteRecord(fields.clone()))
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for RemoteRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Loose equality used for remote comparisons: strings compare
/// case-insensitively, numbers and booleans compare by their text form.
pub fn values_match(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, Value::String(s)) | (Value::String(s), Value::Null) => s.is_empty(),
        (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
        _ => scalar_text(left)
            .zip(scalar_text(right))
            .is_some_and(|(a, b)| a.eq_ignore_ascii_case(&b)),
    }
}

pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
