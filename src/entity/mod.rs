// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Local entities and the identity-keyed stores that hold per-entity results.
//!
//! An [`Entity`] is only ever addressed through its [`EntityId`]. Every unit cache
//! in the pipeline is an [`EntityStore`] keyed by that id, so two entities with
//! identical attributes never collide.

mod schema;
mod store;

pub use schema::{EntityError, EntitySchema};
pub use store::EntityStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Stable identity of a local entity within one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scope (website) an entity is synchronized under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

/// A local business object handed to the pipeline by the load provider.
///
/// Attributes are a read-only key/value view. Units never mutate an entity; any
/// derived data lives in the owning unit's cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub entity_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new(id: u64, entity_type: impl Into<String>) -> Self {
        Self {
            id: EntityId(id),
            entity_type: entity_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter, mostly for loaders and tests.
    pub fn with(mut self, code: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(code.into(), value.into());
        self
    }

    pub fn attribute(&self, code: &str) -> Option<&Value> {
        self.attributes.get(code).filter(|v| !v.is_null())
    }

    /// Attribute rendered as trimmed text; empty strings read as absent.
    pub fn text(&self, code: &str) -> Option<String> {
        let text = match self.attribute(code)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn flag(&self, code: &str) -> bool {
        match self.attribute(code) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
            Some(Value::String(s)) => matches!(s.as_str(), "1" | "true" | "yes"),
            _ => false,
        }
    }
}

/// True for values the mapping layer treats as "nothing to write".
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_trims_and_hides_empty() {
        let entity = Entity::new(1, "customer")
            .with("firstname", "  Ada ")
            .with("lastname", "")
            .with("age", 36);

        assert_eq!(entity.text("firstname").as_deref(), Some("Ada"));
        assert_eq!(entity.text("lastname"), None);
        assert_eq!(entity.text("age").as_deref(), Some("36"));
        assert_eq!(entity.text("missing"), None);
    }

    #[test]
    fn test_null_attribute_reads_as_absent() {
        let entity = Entity::new(1, "customer").with("email", Value::Null);
        assert!(entity.attribute("email").is_none());
    }

    #[test]
    fn test_flag_accepts_common_encodings() {
        let entity = Entity::new(1, "customer")
            .with("a", true)
            .with("b", 1)
            .with("c", "yes")
            .with("d", "no");

        assert!(entity.flag("a"));
        assert!(entity.flag("b"));
        assert!(entity.flag("c"));
        assert!(!entity.flag("d"));
        assert!(!entity.flag("missing"));
    }

    #[test]
    fn test_is_empty_value() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!("   ")));
        assert!(is_empty_value(&json!([])));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
    }
}
