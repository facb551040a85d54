// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::entity::{Entity, EntityId, ScopeId};
use crate::errors::SyncError;
use crate::traits::LoadProvider;
use crate::units::status::QueueUpdate;

/// Load provider over a fixed batch.
#[derive(Debug, Default)]
pub struct InMemoryLoad {
    entities: Vec<Entity>,
    related: HashMap<(EntityId, String), Entity>,
    duplicates: HashMap<EntityId, Vec<EntityId>>,
    scopes: HashMap<EntityId, ScopeId>,
    queue: RwLock<HashMap<EntityId, QueueUpdate>>,
}

impl InMemoryLoad {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            ..Default::default()
        }
    }

    pub fn with_related(mut self, entity: u64, relation: &str, related: Entity) -> Self {
        self.related
            .insert((EntityId(entity), relation.to_string()), related);
        self
    }

    pub fn with_duplicates(mut self, entity: u64, duplicates: &[u64]) -> Self {
        self.duplicates.insert(
            EntityId(entity),
            duplicates.iter().copied().map(EntityId).collect(),
        );
        self
    }

    pub fn with_scope(mut self, entity: u64, scope: u32) -> Self {
        self.scopes.insert(EntityId(entity), ScopeId(scope));
        self
    }
}

#[async_trait]
impl LoadProvider for InMemoryLoad {
    async fn entities(&self) -> Result<Vec<Entity>, SyncError> {
        Ok(self.entities.clone())
    }

    fn related(&self, entity: EntityId, relation: &str) -> Option<Entity> {
        self.related.get(&(entity, relation.to_string())).cloned()
    }

    fn duplicates(&self, entity: EntityId) -> Vec<EntityId> {
        self.duplicates.get(&entity).cloned().unwrap_or_default()
    }

    fn scope(&self, entity: EntityId) -> Option<ScopeId> {
        self.scopes.get(&entity).copied()
    }

    fn queue(&self, entity: EntityId) -> Option<QueueUpdate> {
        self.queue.read().ok()?.get(&entity).cloned()
    }

    async fn update_queue(&self, entity: EntityId, update: &QueueUpdate) -> Result<(), SyncError> {
        let mut queue = self
            .queue
            .write()
            .map_err(|e| SyncError::unit("queue", e.to_string()))?;
        queue.insert(entity, update.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::status::SyncStatus;

    #[tokio::test]
    async fn test_queue_update_is_readable() {
        let load = InMemoryLoad::new(vec![Entity::new(1, "customer")]);
        assert!(load.queue(EntityId(1)).is_none());

        let update = QueueUpdate {
            status: SyncStatus::Complete,
            message: String::new(),
        };
        load.update_queue(EntityId(1), &update).await.unwrap();
        assert_eq!(load.queue(EntityId(1)), Some(update));
    }

    #[test]
    fn test_context_lookups() {
        let load = InMemoryLoad::new(vec![])
            .with_related(1, "customer_address/billing", Entity::new(9, "customer_address"))
            .with_duplicates(1, &[2, 3])
            .with_scope(1, 2);

        assert_eq!(load.related(EntityId(1), "customer_address/billing").map(|e| e.id), Some(EntityId(9)));
        assert!(load.related(EntityId(1), "customer_address/shipping").is_none());
        assert_eq!(load.duplicates(EntityId(1)), vec![EntityId(2), EntityId(3)]);
        assert!(load.duplicates(EntityId(2)).is_empty());
        assert_eq!(load.scope(EntityId(1)), Some(ScopeId(2)));
    }
}
