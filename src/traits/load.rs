// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::entity::{Entity, EntityId, ScopeId};
use crate::errors::SyncError;
use crate::units::status::QueueUpdate;

/// Local persistence boundary: supplies the batch and its per-entity context.
///
/// Context reads (`related`, `duplicates`, `scope`, `queue`) are answered from
/// whatever the provider loaded alongside the batch and never fail; an
/// unknown entity simply has no context.
#[async_trait]
pub trait LoadProvider: Send + Sync {
    /// Entities of the current batch, in batch order.
    async fn entities(&self) -> Result<Vec<Entity>, SyncError>;

    /// Related entity by relation name, e.g. `customer_address/billing`.
    fn related(&self, entity: EntityId, relation: &str) -> Option<Entity>;

    /// Entities recorded as duplicates of `entity`.
    fn duplicates(&self, entity: EntityId) -> Vec<EntityId>;

    fn scope(&self, entity: EntityId) -> Option<ScopeId>;

    /// Current queue record of an entity, if any.
    fn queue(&self, entity: EntityId) -> Option<QueueUpdate>;

    async fn update_queue(&self, entity: EntityId, update: &QueueUpdate) -> Result<(), SyncError>;
}
