// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use super::kinds;
use crate::engine::RunContext;
use crate::entity::{Entity, EntityId, EntitySchema, ScopeId};
use crate::errors::SyncError;
use crate::services::CustomerGroupFilter;
use crate::traits::{LoadProvider, LoadView, Unit};

/// Pulls the batch from the load provider.
///
/// Entities are validated against the declared schema for their type, and an
/// optional customer group filter vetoes entities for every dependent.
pub struct LoadUnit {
    provider: Arc<dyn LoadProvider>,
    schemas: BTreeMap<String, EntitySchema>,
    group_filter: Option<CustomerGroupFilter>,
    entities: Vec<Entity>,
    excluded: HashSet<EntityId>,
}

impl LoadUnit {
    pub fn new(provider: Arc<dyn LoadProvider>) -> Self {
        Self {
            provider,
            schemas: BTreeMap::new(),
            group_filter: None,
            entities: Vec::new(),
            excluded: HashSet::new(),
        }
    }

    pub fn with_schema(mut self, schema: EntitySchema) -> Self {
        self.schemas.insert(schema.entity_type.clone(), schema);
        self
    }

    pub fn with_group_filter(mut self, filter: CustomerGroupFilter) -> Self {
        self.group_filter = Some(filter);
        self
    }
}

#[async_trait]
impl Unit for LoadUnit {
    fn kind(&self) -> &'static str {
        kinds::LOAD
    }

    async fn process(&mut self, _ctx: &RunContext<'_>) -> Result<(), SyncError> {
        let entities = self.provider.entities().await?;

        for entity in &entities {
            if let Some(schema) = self.schemas.get(&entity.entity_type) {
                schema
                    .validate(entity)
                    .map_err(|e| SyncError::unit(kinds::LOAD, e.to_string()))?;
            }
        }

        self.excluded = match &self.group_filter {
            Some(filter) => entities
                .iter()
                .filter(|entity| !filter.keep(entity, self.provider.as_ref()))
                .map(|entity| entity.id)
                .collect(),
            None => HashSet::new(),
        };
        self.entities = entities;
        Ok(())
    }

    fn skipped(&self, entity: EntityId) -> bool {
        self.excluded.contains(&entity)
    }

    fn as_load(&self) -> Option<&dyn LoadView> {
        Some(self)
    }
}

impl LoadView for LoadUnit {
    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn related(&self, entity: EntityId, relation: &str) -> Option<Entity> {
        self.provider.related(entity, relation)
    }

    fn duplicates(&self, entity: EntityId) -> Vec<EntityId> {
        self.provider.duplicates(entity)
    }

    fn scope(&self, entity: EntityId) -> Option<ScopeId> {
        self.provider.scope(entity)
    }

    fn provider(&self) -> Arc<dyn LoadProvider> {
        self.provider.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::InMemoryLoad;
    use crate::engine::UnitGraphBuilder;

    fn batch() -> InMemoryLoad {
        InMemoryLoad::new(vec![
            Entity::new(1, "customer").with("email", "ada@example.com"),
            Entity::new(2, "customer").with("email", "grace@example.com"),
        ])
        .with_related(1, "order", Entity::new(101, "order").with("customer_group_id", 4))
        .with_related(2, "order", Entity::new(102, "order").with("customer_group_id", 9))
    }

    #[tokio::test]
    async fn test_load_exposes_batch() {
        let mut graph = UnitGraphBuilder::new()
            .unit("load", &[], Box::new(LoadUnit::new(Arc::new(batch()))))
            .build()
            .unwrap();
        graph.run_named("load").await.unwrap();

        let load = graph.inspect(graph.unit_id("load").unwrap()).unwrap();
        let view = load.as_load().unwrap();
        assert_eq!(view.entities().len(), 2);
        assert_eq!(view.entity(EntityId(2)).unwrap().text("email").as_deref(), Some("grace@example.com"));
        assert!(!load.skipped(EntityId(1)));
    }

    #[tokio::test]
    async fn test_group_filter_vetoes_entities() {
        let unit = LoadUnit::new(Arc::new(batch()))
            .with_group_filter(CustomerGroupFilter::new(Some([4].into_iter().collect())));
        let mut graph = UnitGraphBuilder::new()
            .unit("load", &[], Box::new(unit))
            .build()
            .unwrap();
        graph.run_named("load").await.unwrap();

        let load = graph.inspect(graph.unit_id("load").unwrap()).unwrap();
        assert!(!load.skipped(EntityId(1)));
        assert!(load.skipped(EntityId(2)));
    }

    #[tokio::test]
    async fn test_schema_violation_fails_load() {
        let unit = LoadUnit::new(Arc::new(batch()))
            .with_schema(EntitySchema::new("customer", 1, ["firstname", "lastname"]));
        let mut graph = UnitGraphBuilder::new()
            .unit("load", &[], Box::new(unit))
            .build()
            .unwrap();

        let error = graph.run_named("load").await.unwrap_err();
        assert!(matches!(error, SyncError::Unit { ref unit, .. } if unit == "load"));
    }
}
