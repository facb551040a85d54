// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Local attribute to remote field resolution.
//!
//! [`MappingUnit`] selects the rule set for each entity (insert or update,
//! depending on whether lookup found a remote record) and resolves every rule
//! to a value through a [`MappingProfile`], which knows the entity type's
//! related objects and special fields. Entities are never mutated; the mapped
//! remote object lives in the unit's cache.

pub mod account;
mod rule;

pub use account::{AccountProfile, DefaultOwner};
pub use rule::{MappingRule, MappingWhen};

use async_trait::async_trait;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use super::kinds;
use crate::engine::{RunContext, UnitId, UnitRef, UnitResolver};
use crate::entity::{is_empty_value, Entity, EntityId, EntityStore, ScopeId};
use crate::errors::{GraphError, SyncError};
use crate::traits::{LoadView, MappingView, SyncGate, Unit};
use crate::transport::{FieldValues, RemoteRecord, ID_FIELD};

/// Everything a profile may read while resolving one value.
pub struct ValueScope<'a> {
    pub entity: &'a Entity,
    pub load: &'a dyn LoadView,
    pub ctx: &'a RunContext<'a>,
    pub lookup: UnitId,
}

impl<'a> ValueScope<'a> {
    /// The entity's matched remote record. Fails while lookup is running.
    pub fn lookup_record(&self) -> Result<Option<&'a RemoteRecord>, SyncError> {
        Ok(self.ctx.lookup(self.lookup)?.record(self.entity.id))
    }

    pub fn scope_id(&self) -> Option<ScopeId> {
        self.load.scope(self.entity.id)
    }
}

/// Entity-type specific parts of mapping.
pub trait MappingProfile: Send + Sync {
    /// The object a rule reads from: the entity itself or a related object.
    fn object_by_entity_type<'e>(
        &self,
        entity: &'e Entity,
        local_object: &str,
        load: &dyn LoadView,
    ) -> Option<Cow<'e, Entity>> {
        base_object(entity, local_object, load)
    }

    /// Raw value of `attribute` on `object`.
    fn prepare_value(
        &self,
        object: &Entity,
        attribute: &str,
        _scope: &ValueScope<'_>,
    ) -> Result<Option<Value>, SyncError> {
        Ok(object.attribute(attribute).cloned())
    }

    /// Fallback when the prepared value is empty.
    fn default_value(&self, rule: &MappingRule, _scope: &ValueScope<'_>) -> Option<Value> {
        base_default(rule)
    }
}

/// The entity when its type is named, else the related object of that name.
pub fn base_object<'e>(
    entity: &'e Entity,
    local_object: &str,
    load: &dyn LoadView,
) -> Option<Cow<'e, Entity>> {
    if local_object == entity.entity_type {
        return Some(Cow::Borrowed(entity));
    }
    load.related(entity.id, local_object).map(Cow::Owned)
}

pub fn base_default(rule: &MappingRule) -> Option<Value> {
    rule.default_value.clone().filter(|v| !is_empty_value(v))
}

pub struct MappingUnit {
    rules: Vec<MappingRule>,
    profile: Box<dyn MappingProfile>,
    gate: Option<Arc<dyn SyncGate>>,
    disable_sync_field: Option<String>,
    load: UnitRef,
    lookup: UnitRef,
    objects: EntityStore<FieldValues>,
    disabled: HashSet<EntityId>,
    errors: EntityStore<Vec<String>>,
}

impl MappingUnit {
    pub fn new(
        rules: Vec<MappingRule>,
        profile: Box<dyn MappingProfile>,
        load: &str,
        lookup: &str,
    ) -> Self {
        Self {
            rules,
            profile,
            gate: None,
            disable_sync_field: None,
            load: UnitRef::named(load),
            lookup: UnitRef::named(lookup),
            objects: EntityStore::new(),
            disabled: HashSet::new(),
            errors: EntityStore::new(),
        }
    }

    pub fn with_gate(mut self, gate: Arc<dyn SyncGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Remote field that, when true on the matched record, disables sync.
    pub fn with_disable_sync_field(mut self, field: impl Into<String>) -> Self {
        self.disable_sync_field = Some(field.into());
        self
    }

    fn is_disabled(&self, entity: &Entity, record: Option<&RemoteRecord>) -> bool {
        if self.gate.as_ref().is_some_and(|gate| gate.is_sync_disabled(entity)) {
            return true;
        }
        match (&self.disable_sync_field, record) {
            (Some(field), Some(record)) => record.get(field).is_some_and(is_truthy),
            _ => false,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    }
}

#[async_trait]
impl Unit for MappingUnit {
    fn kind(&self) -> &'static str {
        kinds::MAPPING
    }

    fn bind(&mut self, resolver: &UnitResolver) -> Result<(), GraphError> {
        self.load.bind(resolver)?;
        self.lookup.bind(resolver)
    }

    async fn process(&mut self, ctx: &RunContext<'_>) -> Result<(), SyncError> {
        let load = ctx.load(self.load.id()?)?;
        let lookup_id = self.lookup.id()?;
        ctx.require_finished(lookup_id)?;
        let lookup = ctx.lookup(lookup_id)?;

        let mut objects = EntityStore::new();
        let mut disabled = HashSet::new();
        let mut errors: EntityStore<Vec<String>> = EntityStore::new();

        for entity in load.entities() {
            if ctx.skipped_by_dependencies(entity.id) {
                continue;
            }
            let record = lookup.record(entity.id);
            if self.is_disabled(entity, record) {
                disabled.insert(entity.id);
                continue;
            }

            let mut object = FieldValues::new();
            for rule in self.mappers(entity, ctx, false)? {
                match self.value(entity, rule, ctx)? {
                    Some(value) => {
                        object.insert(rule.remote_field.clone(), value);
                    }
                    None if rule.required => errors
                        .get_or_insert_with(entity.id, Vec::new)
                        .push(format!("Required field '{}' has no value", rule.remote_field)),
                    None => {}
                }
            }
            if let Some(id) = record.and_then(RemoteRecord::id) {
                object.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            }
            objects.insert(entity.id, object);
        }

        self.objects = objects;
        self.disabled = disabled;
        self.errors = errors;
        Ok(())
    }

    fn skipped(&self, entity: EntityId) -> bool {
        self.disabled.contains(&entity)
    }

    fn entity_errors(&self, entity: EntityId) -> Vec<String> {
        self.errors.get(entity).cloned().unwrap_or_default()
    }

    fn as_mapping(&self) -> Option<&dyn MappingView> {
        Some(self)
    }
}

impl MappingView for MappingUnit {
    fn lookup_unit(&self) -> Result<UnitId, GraphError> {
        self.lookup.id()
    }

    fn mappers(
        &self,
        entity: &Entity,
        ctx: &RunContext<'_>,
        force_update_only: bool,
    ) -> Result<Vec<&MappingRule>, SyncError> {
        let lookup = self.lookup.id()?;
        ctx.require_finished(lookup)?;
        let update = force_update_only || ctx.lookup(lookup)?.record(entity.id).is_some();
        Ok(self.rules.iter().filter(|rule| rule.applies(update)).collect())
    }

    fn value(
        &self,
        entity: &Entity,
        rule: &MappingRule,
        ctx: &RunContext<'_>,
    ) -> Result<Option<Value>, SyncError> {
        let load = ctx.load(self.load.id()?)?;
        let scope = ValueScope {
            entity,
            load,
            ctx,
            lookup: self.lookup.id()?,
        };

        let prepared = match self
            .profile
            .object_by_entity_type(entity, &rule.local_object, load)
        {
            Some(object) => self
                .profile
                .prepare_value(&object, &rule.local_attribute, &scope)?,
            None => None,
        };

        match prepared.filter(|v| !is_empty_value(v)) {
            Some(value) => Ok(Some(value)),
            None => Ok(self.profile.default_value(rule, &scope)),
        }
    }

    fn rule_for(&self, remote_field: &str) -> Option<&MappingRule> {
        self.rules
            .iter()
            .find(|rule| rule.remote_field.eq_ignore_ascii_case(remote_field))
    }

    fn object(&self, entity: EntityId) -> Option<&FieldValues> {
        self.objects.get(entity)
    }
}
