// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Remote schema facts consumed by the pipeline.

use crate::errors::TransportError;
use crate::traits::SchemaSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Id,
    String,
    Textarea,
    Email,
    Phone,
    Url,
    Picklist,
    Boolean,
    Int,
    Double,
    Currency,
    Date,
    Datetime,
    Reference,
    #[serde(other)]
    Other,
}

impl FieldType {
    pub fn is_textual(self) -> bool {
        matches!(
            self,
            FieldType::String
                | FieldType::Textarea
                | FieldType::Email
                | FieldType::Phone
                | FieldType::Url
                | FieldType::Picklist
        )
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, FieldType::Date | FieldType::Datetime)
    }
}

/// Capability facts for one remote field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default = "yes")]
    pub creatable: bool,
    #[serde(default = "yes")]
    pub updateable: bool,
}

fn yes() -> bool {
    true
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            length: None,
            creatable: true,
            updateable: true,
        }
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.creatable = false;
        self.updateable = false;
        self
    }

    pub fn create_only(mut self) -> Self {
        self.updateable = false;
        self
    }

    pub fn update_only(mut self) -> Self {
        self.creatable = false;
        self
    }
}

/// Description of a remote object type: its writable surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ObjectDescription {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|field| field.name.eq_ignore_ascii_case(name))
    }
}

/// Per-run cache in front of a [`SchemaSource`]: each object type is described
/// at most once.
pub struct SchemaRegistry {
    source: Arc<dyn SchemaSource>,
    cache: Mutex<HashMap<String, Arc<ObjectDescription>>>,
}

impl SchemaRegistry {
    pub fn new(source: Arc<dyn SchemaSource>) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn describe(
        &self,
        object_type: &str,
    ) -> Result<Arc<ObjectDescription>, TransportError> {
        let mut cache = self.cache.lock().await;
        if let Some(description) = cache.get(object_type) {
            return Ok(description.clone());
        }

        let description = Arc::new(self.source.describe(object_type).await?);
        cache.insert(object_type.to_string(), description.clone());
        Ok(description)
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SchemaSource for CountingSource {
        async fn describe(&self, object_type: &str) -> Result<ObjectDescription, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ObjectDescription {
                name: object_type.to_string(),
                fields: vec![FieldDescriptor::new("Name", FieldType::String)],
            })
        }
    }

    #[tokio::test]
    async fn test_describe_is_cached_per_type() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let registry = SchemaRegistry::new(source.clone());

        registry.describe("Account").await.unwrap();
        registry.describe("Account").await.unwrap();
        registry.describe("Contact").await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        let description = ObjectDescription {
            name: "Account".into(),
            fields: vec![FieldDescriptor::new("OwnerId", FieldType::Reference)],
        };
        assert!(description.field("ownerid").is_some());
        assert!(description.field("Owner").is_none());
    }

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let field: FieldDescriptor =
            serde_json::from_str(r#"{"name": "Rating__c", "type": "multipicklist"}"#).unwrap();
        assert_eq!(field.field_type, FieldType::Other);
        assert!(field.creatable && field.updateable);
        assert_eq!(field.length, None);
    }
}
