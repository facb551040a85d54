// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{LookupStrategyKind, SyncConfig, UnitConfig};
use crate::engine::{UnitGraph, UnitGraphBuilder, UnitId};
use crate::entity::EntityId;
use crate::errors::{ConfigError, GraphError, SyncError};
use crate::services::{AttributeSyncGate, CustomerGroupFilter};
use crate::traits::{LoadProvider, SchemaSource, StatusStore, SyncGate, Transport, Unit};
use crate::transport::SchemaRegistry;
use crate::units::kinds;
use crate::units::lookup::LookupOptions;
use crate::units::mapping::AccountProfile;
use crate::units::{
    AccountByContactLookup, AccountLookup, LoadUnit, LookupUnit, MappingUnit, StatusUnit,
    SyncStatus, UpsertInputUnit, UpsertOutputUnit,
};

/// External systems a pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub load: Arc<dyn LoadProvider>,
    pub transport: Arc<dyn Transport>,
    pub schema: Arc<dyn SchemaSource>,
    pub status_store: Option<Arc<dyn StatusStore>>,
    pub sync_gate: Option<Arc<dyn SyncGate>>,
}

impl Collaborators {
    pub fn new(
        load: Arc<dyn LoadProvider>,
        transport: Arc<dyn Transport>,
        schema: Arc<dyn SchemaSource>,
    ) -> Self {
        Self {
            load,
            transport,
            schema,
            status_store: None,
            sync_gate: None,
        }
    }

    pub fn with_status_store(mut self, store: Arc<dyn StatusStore>) -> Self {
        self.status_store = Some(store);
        self
    }

    pub fn with_sync_gate(mut self, gate: Arc<dyn SyncGate>) -> Self {
        self.sync_gate = Some(gate);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub entity: EntityId,
    pub status: SyncStatus,
    pub message: String,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl RunReport {
    pub fn status(&self, entity: EntityId) -> Option<SyncStatus> {
        self.entries
            .iter()
            .find(|entry| entry.entity == entity)
            .map(|entry| entry.status)
    }

    pub fn count(&self, status: SyncStatus) -> usize {
        self.entries.iter().filter(|entry| entry.status == status).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Synchronized {} entities in {:?}", self.entries.len(), self.duration)?;
        for entry in &self.entries {
            write!(f, "  {} {}", entry.entity, entry.status)?;
            if !entry.message.is_empty() {
                write!(f, ": {}", entry.message.replace('\n', "; "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u128(duration.as_millis())
    }
}

/// A unit graph assembled from configuration, rooted at its status unit.
///
/// # Examples
///
/// ```rust
/// use entity_sync::backends::memory::{InMemoryLoad, InMemoryTransport};
/// use entity_sync::config::{Collaborators, SyncConfig, SyncPipeline};
/// use std::sync::Arc;
///
/// let config: SyncConfig = serde_yaml::from_str("mapping: []").unwrap();
/// let transport = Arc::new(InMemoryTransport::new());
/// let collaborators = Collaborators::new(
///     Arc::new(InMemoryLoad::new(vec![])),
///     transport.clone(),
///     transport,
/// );
///
/// let pipeline = SyncPipeline::from_config(&config, collaborators).unwrap();
/// assert_eq!(pipeline.graph().len(), 6);
/// ```
pub struct SyncPipeline {
    graph: UnitGraph,
    root: UnitId,
}

impl SyncPipeline {
    pub fn from_config(
        config: &SyncConfig,
        collaborators: Collaborators,
    ) -> Result<Self, SyncError> {
        config
            .validate()
            .map_err(|errors| ConfigError::Invalid(errors.join("\n")))?;

        let schema = Arc::new(SchemaRegistry::new(collaborators.schema.clone()));
        let names = UnitNames::resolve(&config.units)?;

        let mut builder = UnitGraphBuilder::new();
        for unit in &config.units {
            let built = build_unit(unit, config, &collaborators, &schema, &names)?;
            builder.add(unit.id.clone(), unit.depends_on.clone(), built);
        }
        let graph = builder.build()?;
        let root = graph.find_kind(kinds::STATUS)?;

        Ok(Self { graph, root })
    }

    pub fn graph(&self) -> &UnitGraph {
        &self.graph
    }

    pub async fn run(&mut self) -> Result<RunReport, SyncError> {
        let started = Instant::now();
        self.graph.run(self.root).await?;

        let unit = self.graph.inspect(self.root)?;
        let view = unit.as_status().ok_or_else(|| GraphError::MissingCapability {
            unit: self.graph.name(self.root).to_string(),
            capability: "status",
        })?;

        let entries = view
            .statuses()
            .into_iter()
            .map(|(entity, record)| ReportEntry {
                entity,
                status: record.status,
                message: record.message.clone(),
            })
            .collect();

        Ok(RunReport {
            entries,
            duration: started.elapsed(),
        })
    }
}

/// Names of the unit of each kind; references between units go by name.
struct UnitNames {
    load: String,
    lookup: String,
    mapping: String,
    upsert_input: String,
    upsert_output: String,
}

impl UnitNames {
    fn resolve(units: &[UnitConfig]) -> Result<Self, GraphError> {
        Ok(Self {
            load: unit_of_kind(units, kinds::LOAD)?,
            lookup: unit_of_kind(units, kinds::LOOKUP)?,
            mapping: unit_of_kind(units, kinds::MAPPING)?,
            upsert_input: unit_of_kind(units, kinds::UPSERT_INPUT)?,
            upsert_output: unit_of_kind(units, kinds::UPSERT_OUTPUT)?,
        })
    }
}

fn unit_of_kind(units: &[UnitConfig], kind: &'static str) -> Result<String, GraphError> {
    let matches: Vec<&UnitConfig> = units.iter().filter(|unit| unit.kind == kind).collect();
    match matches.as_slice() {
        [unit] => Ok(unit.id.clone()),
        [] => Err(GraphError::UnknownUnit(kind.to_string())),
        many => Err(GraphError::AmbiguousKind {
            kind,
            count: many.len(),
        }),
    }
}

fn build_unit(
    unit: &UnitConfig,
    config: &SyncConfig,
    collaborators: &Collaborators,
    schema: &Arc<SchemaRegistry>,
    names: &UnitNames,
) -> Result<Box<dyn Unit>, SyncError> {
    let built: Box<dyn Unit> = match unit.kind.as_str() {
        kinds::LOAD => {
            let mut load = LoadUnit::new(collaborators.load.clone());
            if let Some(groups) = &config.customer_groups {
                load = load.with_group_filter(CustomerGroupFilter::new(Some(
                    groups.iter().copied().collect(),
                )));
            }
            Box::new(load)
        }
        kinds::LOOKUP => {
            let options = LookupOptions {
                object_type: config.object_type.clone(),
                disable_sync_field: config.lookup.disable_sync_field.clone(),
                skip_mapping_fields: config.lookup.skip_mapping_fields,
            };
            let transport = collaborators.transport.clone();
            match config.lookup.strategy {
                LookupStrategyKind::Account => Box::new(
                    LookupUnit::new(
                        AccountLookup::new(config.lookup.external_id_field.clone()),
                        transport,
                        schema.clone(),
                        options,
                        &names.load,
                    )
                    .with_mapping(&names.mapping),
                ),
                LookupStrategyKind::AccountByContact => {
                    let external_id = config.lookup.external_id_field.clone().ok_or_else(|| {
                        ConfigError::Invalid(
                            "lookup.external_id_field is required for account_by_contact".into(),
                        )
                    })?;
                    let website = config.lookup.website_field.clone().ok_or_else(|| {
                        ConfigError::Invalid(
                            "lookup.website_field is required for account_by_contact".into(),
                        )
                    })?;
                    Box::new(
                        LookupUnit::new(
                            AccountByContactLookup::new(external_id, website),
                            transport,
                            schema.clone(),
                            options,
                            &names.load,
                        )
                        .with_mapping(&names.mapping),
                    )
                }
            }
        }
        kinds::MAPPING => {
            let mut mapping = MappingUnit::new(
                config.mapping.clone(),
                Box::new(AccountProfile::new(config.default_owner.clone())),
                &names.load,
                &names.lookup,
            );
            let gate = collaborators.sync_gate.clone().or_else(|| {
                config.sync_disabled_attribute.as_ref().map(|attribute| {
                    Arc::new(AttributeSyncGate::new(attribute.clone())) as Arc<dyn SyncGate>
                })
            });
            if let Some(gate) = gate {
                mapping = mapping.with_gate(gate);
            }
            if let Some(field) = &config.lookup.disable_sync_field {
                mapping = mapping.with_disable_sync_field(field.clone());
            }
            Box::new(mapping)
        }
        kinds::UPSERT_INPUT => Box::new(
            UpsertInputUnit::new(
                config.object_type.clone(),
                schema.clone(),
                &names.load,
                &names.mapping,
            )
            .with_timezone(config.timezone_offset()?)
            .send_empty_payloads(config.send_empty_payloads),
        ),
        kinds::UPSERT_OUTPUT => Box::new(UpsertOutputUnit::new(
            collaborators.transport.clone(),
            &names.upsert_input,
            &names.lookup,
        )),
        kinds::STATUS => {
            let mut status = StatusUnit::new(&names.load, &names.upsert_output);
            if let Some(store) = &collaborators.status_store {
                status = status.with_store(store.clone());
            }
            Box::new(status)
        }
        other => {
            return Err(ConfigError::Invalid(format!(
                "Unit '{}' has unknown kind '{}'",
                unit.id, other
            ))
            .into())
        }
    };
    Ok(built)
}
