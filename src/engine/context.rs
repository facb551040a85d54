// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::graph::{UnitGraph, UnitId};
use super::status::UnitStatus;
use crate::entity::EntityId;
use crate::errors::GraphError;
use crate::traits::{
    LoadView, LookupView, MappingView, StatusView, Unit, UpsertInputView, UpsertOutputView,
};

/// Read-only view of the graph handed to a running unit.
///
/// A context may carry an "assume complete" override for one unit, created
/// with [`RunContext::assume_complete`]. The override lives in the context
/// value only: dropping the context is all it takes to end it, so there is
/// nothing to restore when the reader fails.
#[derive(Clone, Copy)]
pub struct RunContext<'g> {
    graph: &'g UnitGraph,
    current: UnitId,
    assumed: Option<UnitId>,
}

impl<'g> RunContext<'g> {
    pub(crate) fn new(graph: &'g UnitGraph, current: UnitId) -> Self {
        Self {
            graph,
            current,
            assumed: None,
        }
    }

    /// The unit this context was created for.
    pub fn current(&self) -> UnitId {
        self.current
    }

    pub fn name(&self, id: UnitId) -> &'g str {
        self.graph.name(id)
    }

    pub fn status(&self, id: UnitId) -> UnitStatus {
        if self.assumed == Some(id) {
            return UnitStatus::Complete;
        }
        if id == self.current {
            return UnitStatus::Processing;
        }
        self.graph.status(id)
    }

    /// Derived context in which `id` reads as complete.
    pub fn assume_complete(&self, id: UnitId) -> RunContext<'g> {
        RunContext {
            assumed: Some(id),
            ..*self
        }
    }

    /// Fails unless `id` reads as complete or skipped.
    pub fn require_finished(&self, id: UnitId) -> Result<(), GraphError> {
        let status = self.status(id);
        if status.is_finished() {
            Ok(())
        } else {
            Err(GraphError::NotComplete {
                unit: self.name(id).to_string(),
                status,
            })
        }
    }

    pub fn unit(&self, id: UnitId) -> Result<&'g dyn Unit, GraphError> {
        self.graph.inspect(id)
    }

    pub fn load(&self, id: UnitId) -> Result<&'g dyn LoadView, GraphError> {
        self.unit(id)?
            .as_load()
            .ok_or_else(|| self.missing(id, "load"))
    }

    pub fn lookup(&self, id: UnitId) -> Result<&'g dyn LookupView, GraphError> {
        self.unit(id)?
            .as_lookup()
            .ok_or_else(|| self.missing(id, "lookup"))
    }

    pub fn mapping(&self, id: UnitId) -> Result<&'g dyn MappingView, GraphError> {
        self.unit(id)?
            .as_mapping()
            .ok_or_else(|| self.missing(id, "mapping"))
    }

    pub fn upsert_input(&self, id: UnitId) -> Result<&'g dyn UpsertInputView, GraphError> {
        self.unit(id)?
            .as_upsert_input()
            .ok_or_else(|| self.missing(id, "upsert input"))
    }

    pub fn upsert_output(&self, id: UnitId) -> Result<&'g dyn UpsertOutputView, GraphError> {
        self.unit(id)?
            .as_upsert_output()
            .ok_or_else(|| self.missing(id, "upsert output"))
    }

    pub fn status_view(&self, id: UnitId) -> Result<&'g dyn StatusView, GraphError> {
        self.unit(id)?
            .as_status()
            .ok_or_else(|| self.missing(id, "status"))
    }

    /// Errors every idle unit accumulated for `entity`, in topological order.
    pub fn entity_errors(&self, entity: EntityId) -> Vec<String> {
        self.graph
            .order()
            .iter()
            .filter(|id| **id != self.current)
            .filter_map(|id| self.graph.inspect(*id).ok())
            .flat_map(|unit| unit.entity_errors(entity))
            .collect()
    }

    /// True when any direct dependency of the current unit vetoes `entity`.
    pub fn skipped_by_dependencies(&self, entity: EntityId) -> bool {
        self.graph.nodes[self.current.0]
            .dependencies
            .iter()
            .filter_map(|id| self.graph.inspect(*id).ok())
            .any(|unit| unit.skipped(entity))
    }

    fn missing(&self, id: UnitId, capability: &'static str) -> GraphError {
        GraphError::MissingCapability {
            unit: self.name(id).to_string(),
            capability,
        }
    }
}
