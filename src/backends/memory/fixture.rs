// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{InMemoryLoad, InMemoryTransport};
use crate::entity::Entity;
use crate::errors::ConfigError;
use crate::transport::{ObjectDescription, RemoteRecord};

#[derive(Debug, Clone, Deserialize)]
pub struct RelationFixture {
    pub entity: u64,
    pub relation: String,
    pub related: Entity,
}

/// A whole local batch plus the remote system it syncs against, as JSON.
///
/// ```json
/// {
///   "entities": [{ "id": 1, "entity_type": "customer", "attributes": { "email": "ada@example.com" } }],
///   "relations": [],
///   "duplicates": { "1": [2] },
///   "scopes": { "1": 1 },
///   "records": { "Account": [{ "Id": "001A", "Name": "Analytical Engines" }] },
///   "descriptions": [{ "name": "Account", "fields": [{ "name": "Name", "type": "string" }] }],
///   "unique_fields": { "Account": ["Name"] },
///   "deferred": []
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub entities: Vec<Entity>,
    pub relations: Vec<RelationFixture>,
    pub duplicates: BTreeMap<u64, Vec<u64>>,
    pub scopes: BTreeMap<u64, u32>,
    pub records: BTreeMap<String, Vec<RemoteRecord>>,
    pub descriptions: Vec<ObjectDescription>,
    pub unique_fields: BTreeMap<String, Vec<String>>,
    pub deferred: Vec<u64>,
}

impl Fixture {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn into_backends(self) -> (InMemoryLoad, InMemoryTransport) {
        let mut load = InMemoryLoad::new(self.entities);
        for relation in self.relations {
            load = load.with_related(relation.entity, &relation.relation, relation.related);
        }
        for (entity, duplicates) in &self.duplicates {
            load = load.with_duplicates(*entity, duplicates);
        }
        for (entity, scope) in self.scopes {
            load = load.with_scope(entity, scope);
        }

        let mut transport = InMemoryTransport::new();
        for description in self.descriptions {
            transport = transport.with_description(description);
        }
        for (object_type, records) in self.records {
            transport = transport.with_records(&object_type, records);
        }
        for (object_type, fields) in &self.unique_fields {
            for field in fields {
                transport = transport.with_unique_field(object_type, field);
            }
        }
        for entity in self.deferred {
            transport = transport.with_deferred(entity);
        }

        (load, transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;
    use crate::traits::{LoadProvider, SchemaSource};

    #[tokio::test]
    async fn test_fixture_builds_backends() {
        let fixture = Fixture::from_json(
            r#"{
                "entities": [
                    { "id": 1, "entity_type": "customer", "attributes": { "email": "ada@example.com" } },
                    { "id": 2, "entity_type": "customer" }
                ],
                "relations": [
                    { "entity": 1, "relation": "customer_address/billing",
                      "related": { "id": 10, "entity_type": "customer_address", "attributes": { "company": "Analytical Engines" } } }
                ],
                "duplicates": { "1": [2] },
                "records": { "Account": [{ "Id": "001A", "Name": "Analytical Engines" }] },
                "descriptions": [{ "name": "Account", "fields": [{ "name": "Name", "type": "string", "length": 255 }] }]
            }"#,
        )
        .unwrap();

        let (load, transport) = fixture.into_backends();

        assert_eq!(load.entities().await.unwrap().len(), 2);
        assert_eq!(load.duplicates(EntityId(1)), vec![EntityId(2)]);
        assert!(load.related(EntityId(1), "customer_address/billing").is_some());
        assert_eq!(transport.records("Account").await.len(), 1);
        assert_eq!(transport.describe("Account").await.unwrap().fields.len(), 1);
    }

    #[tokio::test]
    async fn test_bundled_fixture_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/customers.json");
        let (load, transport) = Fixture::from_file(path).unwrap().into_backends();

        assert_eq!(load.entities().await.unwrap().len(), 4);
        assert_eq!(load.duplicates(EntityId(1)), vec![EntityId(4)]);
        assert_eq!(transport.records("Account").await.len(), 1);
    }

    #[test]
    fn test_malformed_fixture_is_rejected() {
        assert!(matches!(Fixture::from_json("{ not json"), Err(ConfigError::Invalid(_))));
    }
}
