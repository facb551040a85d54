// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Optional collaborators the pipeline consults but does not own.

use async_trait::async_trait;

use crate::entity::{Entity, EntityId, ScopeId};

/// Durable per-entity sync flag. Best effort: failures are logged by the
/// caller and never fail the run.
#[async_trait]
pub trait StatusStore: Send + Sync {
    async fn save_status(
        &self,
        entity: EntityId,
        success: bool,
        scope: Option<ScopeId>,
    ) -> anyhow::Result<()>;
}

/// Answers whether synchronization is switched off for an entity.
pub trait SyncGate: Send + Sync {
    fn is_sync_disabled(&self, entity: &Entity) -> bool;
}

/// Known local-to-remote id mappings, keyed by local key and scope.
pub trait MappedIdSource: Send + Sync {
    fn mapped_id(&self, key: u64, scope: ScopeId) -> Option<String>;
}
