// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Locating existing remote records.
//!
//! [`LookupUnit`] owns the protocol: build one query for the batch, widen its
//! column list with the fields mapping will compare against, send it, index
//! the rows, and resolve each entity to at most one best match through
//! integer priority tiers (lower is stronger). A [`LookupStrategy`] supplies
//! the object-specific parts.

mod account;
mod contact;

pub use account::AccountLookup;
pub use contact::AccountByContactLookup;

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use super::kinds;
use crate::engine::{RunContext, UnitRef, UnitResolver};
use crate::entity::{Entity, EntityId, EntityStore};
use crate::errors::{GraphError, SyncError};
use crate::observability::messages::lookup::{
    LookupSkipped, MappingFieldsSelected, QueryCompleted, QueryRequested, RecordMatched,
    RecordNotFound,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{LoadView, LookupView, MappingView, Transport, Unit};
use crate::transport::{QueryInput, QueryOutput, RemoteRecord, SchemaRegistry, ID_FIELD};
use crate::units::mapping::account::company_by_customer;

/// Priority tier to row indices into the query output. Iteration order is
/// ascending priority; rows keep their output order within a tier.
pub type PriorityTiers = BTreeMap<u32, Vec<usize>>;

/// Lookup keys to query output rows, grouped by key kind (`name`, `email`...).
#[derive(Debug, Default, Clone)]
pub struct SearchIndex {
    keys: HashMap<&'static str, HashMap<String, Vec<usize>>>,
}

impl SearchIndex {
    /// Index `row` under `key`, compared case-insensitively. Empty keys are
    /// ignored.
    pub fn insert(&mut self, kind: &'static str, key: &str, row: usize) {
        let key = key.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        self.keys
            .entry(kind)
            .or_default()
            .entry(key)
            .or_default()
            .push(row);
    }

    pub fn rows(&self, kind: &str, key: &str) -> &[usize] {
        self.keys
            .get(kind)
            .and_then(|keys| keys.get(&key.trim().to_lowercase()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// What strategies may read while building the query and ranking rows.
pub struct LookupScope<'a> {
    pub ctx: &'a RunContext<'a>,
    pub load: &'a dyn LoadView,
    pub mapping: Option<&'a dyn MappingView>,
}

impl LookupScope<'_> {
    /// Account name for an entity: the mapped `Name` value when a rule exists,
    /// else the billing company, else "first last".
    pub fn company_name(&self, entity: &Entity) -> String {
        let mapped = self.mapping.and_then(|mapping| {
            let rule = mapping.rule_for("Name")?;
            let value = mapping.value(entity, rule, self.ctx).ok()??;
            crate::transport::record::scalar_text(&value).filter(|name| !name.trim().is_empty())
        });
        mapped.unwrap_or_else(|| {
            let billing = self.load.related(entity.id, "customer_address/billing");
            company_by_customer(entity, billing.as_ref())
        })
    }
}

/// Object-specific parts of a lookup.
pub trait LookupStrategy: Send + Sync {
    /// Remote object type queried.
    fn object_type(&self) -> &str;

    /// Select columns and add one filter fragment per entity.
    fn build_query(&self, input: &mut QueryInput, entities: &[&Entity], scope: &LookupScope<'_>);

    fn collect_index(&self, output: &QueryOutput) -> SearchIndex;

    fn search_priority_order(
        &self,
        index: &SearchIndex,
        entity: &Entity,
        scope: &LookupScope<'_>,
    ) -> PriorityTiers;

    /// Transform a matched row before caching it; `None` discards the row.
    fn prepare_record(&self, record: &RemoteRecord) -> Option<RemoteRecord> {
        Some(record.clone())
    }

    /// Column under which a field of the upserted object is selected.
    fn mapped_column(&self, field: &str) -> String {
        field.to_string()
    }
}

/// Cached lookup result for one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResult {
    /// Every candidate across all tiers, unique by remote id.
    pub records: Vec<RemoteRecord>,
    /// Best match; absent when nothing matched.
    pub record: Option<RemoteRecord>,
}

/// Options shared by every lookup strategy.
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    /// Remote object type written by the upsert; its description decides which
    /// mapped fields can be selected.
    pub object_type: String,
    pub disable_sync_field: Option<String>,
    pub skip_mapping_fields: bool,
}

pub struct LookupUnit<S: LookupStrategy> {
    strategy: S,
    transport: Arc<dyn Transport>,
    schema: Arc<SchemaRegistry>,
    options: LookupOptions,
    load: UnitRef,
    mapping: Option<UnitRef>,
    cache: EntityStore<LookupResult>,
    all_records: QueryOutput,
}

impl<S: LookupStrategy> LookupUnit<S> {
    pub fn new(
        strategy: S,
        transport: Arc<dyn Transport>,
        schema: Arc<SchemaRegistry>,
        options: LookupOptions,
        load: &str,
    ) -> Self {
        Self {
            strategy,
            transport,
            schema,
            options,
            load: UnitRef::named(load),
            mapping: None,
            cache: EntityStore::new(),
            all_records: QueryOutput::default(),
        }
    }

    /// Reference the mapping unit whose fields should be selected.
    pub fn with_mapping(mut self, mapping: &str) -> Self {
        self.mapping = Some(UnitRef::named(mapping));
        self
    }

    pub fn result(&self, entity: EntityId) -> Option<&LookupResult> {
        self.cache.get(entity)
    }

    /// Widen the select list with the remote fields mapping writes on update.
    ///
    /// Mapping refuses to hand out rules before lookup is complete, so the
    /// rules are read through a context in which lookup is assumed complete.
    async fn add_mapping_fields_to_select(
        &self,
        input: &mut QueryInput,
        entities: &[&Entity],
        scope: &LookupScope<'_>,
    ) -> Result<(), SyncError> {
        if self.options.skip_mapping_fields {
            return Ok(());
        }

        if let Some(field) = &self.options.disable_sync_field {
            input.select(self.strategy.mapped_column(field));
        }

        let (Some(mapping), Some(entity)) = (scope.mapping, entities.first()) else {
            return Ok(());
        };
        let forced = scope.ctx.assume_complete(mapping.lookup_unit()?);
        let rules = mapping.mappers(entity, &forced, true)?;
        if rules.is_empty() {
            return Ok(());
        }

        let description = self.schema.describe(&self.options.object_type).await?;
        let mut added = Vec::new();
        for rule in rules {
            let field = rule.remote_field.as_str();
            if field.eq_ignore_ascii_case(ID_FIELD) || description.field(field).is_none() {
                continue;
            }
            let column = self.strategy.mapped_column(field);
            if input.select(column.clone()) {
                added.push(column);
            }
        }

        if !added.is_empty() {
            MappingFieldsSelected {
                object_type: input.from.as_str(),
                columns: &added,
            }
            .log();
        }
        Ok(())
    }

    fn process_output(
        &self,
        output: &QueryOutput,
        entities: &[&Entity],
        scope: &LookupScope<'_>,
    ) -> EntityStore<LookupResult> {
        let index = self.strategy.collect_index(output);
        let mut cache = EntityStore::new();

        for entity in entities {
            let mut tiers = self.strategy.search_priority_order(&index, entity, scope);
            tiers.retain(|_, rows| {
                rows.retain(|row| *row < output.len());
                !rows.is_empty()
            });
            if tiers.is_empty() {
                RecordNotFound { entity: entity.id }.log();
                continue;
            }

            let records = merge_lookup_result(&tiers, output, |r| self.strategy.prepare_record(r));
            let best = filter_by_priority(&tiers).and_then(|(priority, row)| {
                let record = output.get(row).and_then(|r| self.strategy.prepare_record(r))?;
                Some((priority, record))
            });

            let record = match best {
                Some((priority, record)) => {
                    RecordMatched {
                        entity: entity.id,
                        record_id: record.id().unwrap_or_default(),
                        priority,
                        candidates: records.len(),
                    }
                    .log();
                    Some(record)
                }
                None => {
                    RecordNotFound { entity: entity.id }.log();
                    None
                }
            };
            cache.insert(entity.id, LookupResult { records, record });
        }
        cache
    }
}

#[async_trait]
impl<S: LookupStrategy + 'static> Unit for LookupUnit<S> {
    fn kind(&self) -> &'static str {
        kinds::LOOKUP
    }

    fn bind(&mut self, resolver: &UnitResolver) -> Result<(), GraphError> {
        self.load.bind(resolver)?;
        if let Some(mapping) = &mut self.mapping {
            mapping.bind(resolver)?;
        }
        Ok(())
    }

    async fn process(&mut self, ctx: &RunContext<'_>) -> Result<(), SyncError> {
        let load = ctx.load(self.load.id()?)?;
        let mapping = match &self.mapping {
            Some(reference) => Some(ctx.mapping(reference.id()?)?),
            None => None,
        };
        let scope = LookupScope { ctx, load, mapping };

        let entities: Vec<&Entity> = load
            .entities()
            .iter()
            .filter(|entity| !ctx.skipped_by_dependencies(entity.id))
            .collect();

        let mut input = QueryInput::new(self.strategy.object_type());
        self.strategy.build_query(&mut input, &entities, &scope);
        self.add_mapping_fields_to_select(&mut input, &entities, &scope)
            .await?;

        if input.count() == 0 {
            LookupSkipped {
                object_type: &input.from,
            }
            .log();
            self.cache.clear();
            self.all_records = QueryOutput::default();
            return Ok(());
        }

        let query = input.to_string();
        QueryRequested {
            object_type: &input.from,
            entity_count: input.count(),
            query: &query,
        }
        .log();
        let output = self.transport.query(&input).await?;
        QueryCompleted {
            object_type: &input.from,
            record_count: output.len(),
        }
        .log();

        self.cache = self.process_output(&output, &entities, &scope);
        self.all_records = output;
        Ok(())
    }

    fn as_lookup(&self) -> Option<&dyn LookupView> {
        Some(self)
    }
}

impl<S: LookupStrategy> LookupView for LookupUnit<S> {
    fn record(&self, entity: EntityId) -> Option<&RemoteRecord> {
        self.cache.get(entity).and_then(|result| result.record.as_ref())
    }

    fn records(&self, entity: EntityId) -> &[RemoteRecord] {
        self.cache
            .get(entity)
            .map(|result| result.records.as_slice())
            .unwrap_or(&[])
    }

    fn all_records(&self) -> &QueryOutput {
        &self.all_records
    }
}

/// All candidates across tiers, in tier order, unique by remote id. The
/// first occurrence of an id wins; records without an id are all kept.
pub fn merge_lookup_result(
    tiers: &PriorityTiers,
    output: &QueryOutput,
    prepare: impl Fn(&RemoteRecord) -> Option<RemoteRecord>,
) -> Vec<RemoteRecord> {
    let mut seen = HashSet::new();
    tiers
        .values()
        .flatten()
        .filter_map(|row| output.get(*row))
        .filter_map(prepare)
        .filter(|record| match record.id().filter(|id| !id.is_empty()) {
            Some(id) => seen.insert(id.to_string()),
            None => true,
        })
        .collect()
}

/// First row of the first non-empty tier, with its priority.
pub fn filter_by_priority(tiers: &PriorityTiers) -> Option<(u32, usize)> {
    tiers
        .iter()
        .find_map(|(priority, rows)| rows.first().map(|row| (*priority, *row)))
}
