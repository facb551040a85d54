// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The pipeline stage abstraction and its capability views.
//!
//! A [`Unit`] is polymorphic over one common interface. Stages that other
//! stages need to read expose a typed view (`as_lookup`, `as_mapping`, ...)
//! instead of being downcast, so an alternative lookup or mapping for another
//! remote object type slots in without touching its readers.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::engine::{RunContext, UnitId, UnitResolver};
use crate::entity::{Entity, EntityId, ScopeId};
use crate::errors::{GraphError, SyncError};
use crate::traits::LoadProvider;
use crate::transport::{FieldValues, QueryOutput, RemoteRecord, UpsertOutcome};
use crate::units::mapping::MappingRule;
use crate::units::status::StatusRecord;
use crate::units::upsert::UpsertPayload;

#[async_trait]
pub trait Unit: Send + Sync {
    /// Short kind tag (`load`, `lookup`, `mapping`, ...), used in logs and to
    /// locate the single unit of a kind.
    fn kind(&self) -> &'static str;

    /// Resolve named references to other units. Called once while the graph
    /// is built.
    fn bind(&mut self, _resolver: &UnitResolver) -> Result<(), GraphError> {
        Ok(())
    }

    /// Do the unit's work for the whole batch. Runs at most once per graph.
    async fn process(&mut self, ctx: &RunContext<'_>) -> Result<(), SyncError>;

    /// Per-entity veto: dependents leave a skipped entity out of their work.
    fn skipped(&self, _entity: EntityId) -> bool {
        false
    }

    /// Entity-level errors this unit accumulated.
    fn entity_errors(&self, _entity: EntityId) -> Vec<String> {
        Vec::new()
    }

    fn as_load(&self) -> Option<&dyn LoadView> {
        None
    }

    fn as_lookup(&self) -> Option<&dyn LookupView> {
        None
    }

    fn as_mapping(&self) -> Option<&dyn MappingView> {
        None
    }

    fn as_upsert_input(&self) -> Option<&dyn UpsertInputView> {
        None
    }

    fn as_upsert_output(&self) -> Option<&dyn UpsertOutputView> {
        None
    }

    fn as_status(&self) -> Option<&dyn StatusView> {
        None
    }
}

/// The loaded batch and its context.
pub trait LoadView: Send + Sync {
    fn entities(&self) -> &[Entity];

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities().iter().find(|entity| entity.id == id)
    }

    fn related(&self, entity: EntityId, relation: &str) -> Option<Entity>;

    fn duplicates(&self, entity: EntityId) -> Vec<EntityId>;

    fn scope(&self, entity: EntityId) -> Option<ScopeId>;

    fn provider(&self) -> Arc<dyn LoadProvider>;
}

/// Remote records matched to entities.
pub trait LookupView: Send + Sync {
    /// Best match, absent when nothing matched.
    fn record(&self, entity: EntityId) -> Option<&RemoteRecord>;

    /// Every candidate across all priority tiers, deduplicated by remote id.
    fn records(&self, entity: EntityId) -> &[RemoteRecord];

    /// The complete query output of the run.
    fn all_records(&self) -> &QueryOutput;
}

/// Local-to-remote field resolution.
pub trait MappingView: Send + Sync {
    /// The lookup unit this mapping reads existing records from.
    fn lookup_unit(&self) -> Result<UnitId, GraphError>;

    /// Rules that apply to `entity`. Requires the lookup unit to read as
    /// complete in `ctx`; `force_update_only` picks the update rule set without
    /// reading the lookup record.
    fn mappers(
        &self,
        entity: &Entity,
        ctx: &RunContext<'_>,
        force_update_only: bool,
    ) -> Result<Vec<&MappingRule>, SyncError>;

    /// Value one rule resolves to for `entity`, `None` when there is nothing
    /// to write.
    fn value(
        &self,
        entity: &Entity,
        rule: &MappingRule,
        ctx: &RunContext<'_>,
    ) -> Result<Option<Value>, SyncError>;

    /// The rule writing `remote_field`, compared case-insensitively.
    fn rule_for(&self, remote_field: &str) -> Option<&MappingRule>;

    /// Mapped remote object for an entity after the unit has run.
    fn object(&self, entity: EntityId) -> Option<&FieldValues>;
}

/// Validated write payloads.
pub trait UpsertInputView: Send + Sync {
    fn object_type(&self) -> &str;

    fn payload(&self, entity: EntityId) -> Option<&UpsertPayload>;

    fn entities(&self) -> Vec<EntityId>;
}

/// Remote verdicts from the upsert call.
pub trait UpsertOutputView: Send + Sync {
    /// The upsert input unit whose payloads were sent.
    fn input_unit(&self) -> Result<UnitId, GraphError>;

    fn outcome(&self, entity: EntityId) -> Option<&UpsertOutcome>;
}

/// Reconciled per-entity status.
pub trait StatusView: Send + Sync {
    fn status(&self, entity: EntityId) -> Option<&StatusRecord>;

    fn statuses(&self) -> Vec<(EntityId, &StatusRecord)>;
}
