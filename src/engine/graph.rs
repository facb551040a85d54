// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The unit dependency graph.
//!
//! Units are registered by name on a [`UnitGraphBuilder`]. [`UnitGraphBuilder::build`]
//! validates the graph, resolves every name to a [`UnitId`] exactly once, lets
//! each unit bind its named references, and precomputes a topological order
//! with Kahn's algorithm. After that nothing is looked up by string on the hot
//! path.
//!
//! ## Running
//!
//! [`UnitGraph::run`] executes a root unit and every unit it transitively
//! depends on, in topological order, one at a time. Finished units are
//! memoized, so running a second root that shares dependencies does not
//! repeat them. While a unit runs it is moved out of its slot and receives a
//! [`RunContext`] over the rest of the graph; asking for the running unit
//! through that context yields [`GraphError::UnitBusy`].
//!
//! ## Forced status
//!
//! [`UnitGraph::force_status`] and [`UnitGraph::restore_status`] form a strict,
//! single-level push/pop that changes what *readers* see. The stored status is
//! never written by a force. Prefer [`UnitGraph::with_forced_status`], which
//! restores on every exit path including panics.
//!
//! ```rust
//! use entity_sync::engine::{UnitGraphBuilder, UnitStatus};
//! # use entity_sync::engine::RunContext;
//! # use entity_sync::errors::SyncError;
//! # use entity_sync::traits::Unit;
//! # struct Noop;
//! # #[async_trait::async_trait]
//! # impl Unit for Noop {
//! #     fn kind(&self) -> &'static str { "noop" }
//! #     async fn process(&mut self, _: &RunContext<'_>) -> Result<(), SyncError> { Ok(()) }
//! # }
//!
//! let mut graph = UnitGraphBuilder::new()
//!     .unit("load", &[], Box::new(Noop))
//!     .unit("lookup", &["load"], Box::new(Noop))
//!     .build()
//!     .unwrap();
//!
//! let lookup = graph.unit_id("lookup").unwrap();
//! let seen = graph
//!     .with_forced_status(lookup, UnitStatus::Complete, |g| g.status(lookup))
//!     .unwrap();
//!
//! assert_eq!(seen, UnitStatus::Complete);
//! assert_eq!(graph.status(lookup), UnitStatus::Pending);
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::Instrument;

use super::context::RunContext;
use super::status::UnitStatus;
use crate::config::{validate_dependency_graph, UnitSpec};
use crate::errors::{GraphError, SyncError, ValidationError};
use crate::observability::messages::engine::{
    RunCompleted, RunStarted, StatusForced, StatusRestored, UnitCompleted, UnitFailed,
    UnitMemoized, UnitStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Unit;

/// Typed handle to a unit, valid for the graph that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub(crate) usize);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Name-to-id table handed to [`Unit::bind`].
#[derive(Debug, Clone, Default)]
pub struct UnitResolver {
    ids: HashMap<String, UnitId>,
}

impl UnitResolver {
    pub fn resolve(&self, name: &str) -> Result<UnitId, GraphError> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::UnknownUnit(name.to_string()))
    }
}

/// Reference to another unit by name, bound to a [`UnitId`] during build.
///
/// Units hold these for collaborators that are not dependencies, e.g. lookup
/// reading the mapping rules of a unit that itself depends on lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRef {
    name: String,
    id: Option<UnitId>,
}

impl UnitRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bind(&mut self, resolver: &UnitResolver) -> Result<(), GraphError> {
        self.id = Some(resolver.resolve(&self.name)?);
        Ok(())
    }

    /// The bound id; an unbound reference reads as an unknown unit.
    pub fn id(&self) -> Result<UnitId, GraphError> {
        self.id
            .ok_or_else(|| GraphError::UnknownUnit(self.name.clone()))
    }
}

pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) dependencies: Vec<UnitId>,
    pub(crate) status: UnitStatus,
    pub(crate) unit: Option<Box<dyn Unit>>,
}

struct Registration {
    name: String,
    depends_on: Vec<String>,
    unit: Box<dyn Unit>,
}

#[derive(Default)]
pub struct UnitGraphBuilder {
    registrations: Vec<Registration>,
}

impl UnitGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(mut self, name: &str, depends_on: &[&str], unit: Box<dyn Unit>) -> Self {
        self.add(name, depends_on.iter().map(|d| d.to_string()).collect(), unit);
        self
    }

    pub fn add(&mut self, name: impl Into<String>, depends_on: Vec<String>, unit: Box<dyn Unit>) {
        self.registrations.push(Registration {
            name: name.into(),
            depends_on,
            unit,
        });
    }

    pub fn build(self) -> Result<UnitGraph, GraphError> {
        let specs: Vec<UnitSpec> = self
            .registrations
            .iter()
            .map(|r| UnitSpec {
                id: r.name.clone(),
                depends_on: r.depends_on.clone(),
            })
            .collect();
        validate_dependency_graph(&specs).map_err(GraphError::Invalid)?;

        let resolver = UnitResolver {
            ids: self
                .registrations
                .iter()
                .enumerate()
                .map(|(index, r)| (r.name.clone(), UnitId(index)))
                .collect(),
        };

        let mut nodes = Vec::with_capacity(self.registrations.len());
        for mut registration in self.registrations {
            registration.unit.bind(&resolver)?;
            let dependencies = registration
                .depends_on
                .iter()
                .map(|d| resolver.resolve(d))
                .collect::<Result<Vec<_>, _>>()?;
            nodes.push(Node {
                name: registration.name,
                dependencies,
                status: UnitStatus::Pending,
                unit: Some(registration.unit),
            });
        }

        let order = compute_topological_order(&nodes)?;

        Ok(UnitGraph {
            nodes,
            order,
            resolver,
            forced: None,
        })
    }
}

/// Owns every unit of one pipeline run.
pub struct UnitGraph {
    pub(crate) nodes: Vec<Node>,
    order: Vec<UnitId>,
    resolver: UnitResolver,
    forced: Option<(UnitId, UnitStatus)>,
}

impl UnitGraph {
    pub fn unit_id(&self, name: &str) -> Result<UnitId, GraphError> {
        self.resolver.resolve(name)
    }

    pub fn name(&self, id: UnitId) -> &str {
        self.nodes.get(id.0).map(|n| n.name.as_str()).unwrap_or("<unknown>")
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every unit in topological order.
    pub fn order(&self) -> &[UnitId] {
        &self.order
    }

    /// The single unit of a kind, e.g. the `status` unit to run as root.
    pub fn find_kind(&self, kind: &'static str) -> Result<UnitId, GraphError> {
        let matches: Vec<UnitId> = self
            .order
            .iter()
            .copied()
            .filter(|id| {
                self.nodes[id.0]
                    .unit
                    .as_ref()
                    .is_some_and(|unit| unit.kind() == kind)
            })
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(GraphError::UnknownUnit(kind.to_string())),
            _ => Err(GraphError::AmbiguousKind {
                kind,
                count: matches.len(),
            }),
        }
    }

    /// Status as readers see it, honouring an active forced override.
    pub fn status(&self, id: UnitId) -> UnitStatus {
        match self.forced {
            Some((forced, status)) if forced == id => status,
            _ => self.true_status(id),
        }
    }

    /// Stored status, ignoring any forced override.
    pub fn true_status(&self, id: UnitId) -> UnitStatus {
        self.nodes
            .get(id.0)
            .map(|n| n.status)
            .unwrap_or(UnitStatus::Pending)
    }

    /// Read-only access to a unit that is not currently running.
    pub fn inspect(&self, id: UnitId) -> Result<&dyn Unit, GraphError> {
        let node = self
            .nodes
            .get(id.0)
            .ok_or_else(|| GraphError::UnknownUnit(id.to_string()))?;
        node.unit
            .as_deref()
            .ok_or_else(|| GraphError::UnitBusy(node.name.clone()))
    }

    /// Mark a pending unit as skipped so dependents may run without it.
    pub fn mark_skipped(&mut self, id: UnitId) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or_else(|| GraphError::UnknownUnit(id.to_string()))?;
        if node.status == UnitStatus::Pending {
            node.status = UnitStatus::Skipped;
        }
        Ok(())
    }

    pub fn force_status(&mut self, id: UnitId, status: UnitStatus) -> Result<(), GraphError> {
        if let Some((active, _)) = self.forced {
            return Err(GraphError::NestedForce {
                active: self.name(active).to_string(),
                requested: self.name(id).to_string(),
            });
        }
        StatusForced {
            unit: self.name(id),
            status,
            true_status: self.true_status(id),
        }
        .log();
        self.forced = Some((id, status));
        Ok(())
    }

    pub fn restore_status(&mut self, id: UnitId) -> Result<(), GraphError> {
        match self.forced {
            Some((active, _)) if active == id => {
                self.forced = None;
                StatusRestored {
                    unit: self.name(id),
                    status: self.true_status(id),
                }
                .log();
                Ok(())
            }
            _ => {
                debug_assert!(
                    false,
                    "restore_status('{}') without a matching force_status",
                    self.name(id)
                );
                Err(GraphError::UnpairedRestore(self.name(id).to_string()))
            }
        }
    }

    /// Run `f` with `id` forced to `status`, restoring afterwards even if `f`
    /// panics.
    pub fn with_forced_status<R>(
        &mut self,
        id: UnitId,
        status: UnitStatus,
        f: impl FnOnce(&UnitGraph) -> R,
    ) -> Result<R, GraphError> {
        self.force_status(id, status)?;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(self)));
        self.restore_status(id)?;
        match outcome {
            Ok(result) => Ok(result),
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    /// `root` and everything it transitively depends on, in topological order.
    pub fn plan(&self, root: UnitId) -> Vec<UnitId> {
        let mut needed = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if needed.insert(id) {
                if let Some(node) = self.nodes.get(id.0) {
                    stack.extend(node.dependencies.iter().copied());
                }
            }
        }
        self.order
            .iter()
            .copied()
            .filter(|id| needed.contains(id))
            .collect()
    }

    /// Run `root` after all of its dependencies. Finished units are skipped.
    pub async fn run(&mut self, root: UnitId) -> Result<(), SyncError> {
        if root.0 >= self.nodes.len() {
            return Err(GraphError::UnknownUnit(root.to_string()).into());
        }

        let plan = self.plan(root);
        let started = Instant::now();
        let run = RunStarted {
            root: self.name(root),
            unit_count: plan.len(),
        };
        run.log();
        let run_span = run.span("unit_graph_run");

        for id in plan {
            self.run_unit(id).instrument(run_span.clone()).await?;
        }

        RunCompleted {
            root: self.name(root),
            duration: started.elapsed(),
        }
        .log();
        Ok(())
    }

    pub async fn run_named(&mut self, root: &str) -> Result<(), SyncError> {
        let id = self.unit_id(root)?;
        self.run(id).await
    }

    async fn run_unit(&mut self, id: UnitId) -> Result<(), SyncError> {
        let status = self.status(id);
        match status {
            UnitStatus::Complete | UnitStatus::Skipped => {
                UnitMemoized {
                    unit: self.name(id),
                    status,
                }
                .log();
                return Ok(());
            }
            UnitStatus::Processing => {
                return Err(GraphError::UnitBusy(self.name(id).to_string()).into())
            }
            UnitStatus::Error => {
                return Err(GraphError::NotComplete {
                    unit: self.name(id).to_string(),
                    status,
                }
                .into())
            }
            UnitStatus::Pending => {}
        }

        let node = &mut self.nodes[id.0];
        let mut unit = node
            .unit
            .take()
            .ok_or_else(|| GraphError::UnitBusy(node.name.clone()))?;
        node.status = UnitStatus::Processing;

        let started_msg = UnitStarted {
            unit: &node.name,
            kind: unit.kind(),
        };
        started_msg.log();
        let span = started_msg.span("unit");
        let started = Instant::now();

        let result = {
            let ctx = RunContext::new(self, id);
            unit.process(&ctx).instrument(span).await
        };

        let node = &mut self.nodes[id.0];
        match &result {
            Ok(()) => {
                node.status = UnitStatus::Complete;
                UnitCompleted {
                    unit: &node.name,
                    kind: unit.kind(),
                    duration: started.elapsed(),
                }
                .log();
            }
            Err(error) => {
                node.status = UnitStatus::Error;
                UnitFailed {
                    unit: &node.name,
                    error,
                }
                .log();
            }
        }
        node.unit = Some(unit);
        result
    }
}

/// Kahn's algorithm over the dependency edges. Units within a level keep
/// their registration order, so the result is deterministic.
fn compute_topological_order(nodes: &[Node]) -> Result<Vec<UnitId>, GraphError> {
    let mut in_degree: Vec<usize> = nodes.iter().map(|n| n.dependencies.len()).collect();
    let mut dependents: Vec<Vec<UnitId>> = vec![Vec::new(); nodes.len()];
    for (index, node) in nodes.iter().enumerate() {
        for dependency in &node.dependencies {
            dependents[dependency.0].push(UnitId(index));
        }
    }

    let mut queue: VecDeque<UnitId> = (0..nodes.len())
        .filter(|&index| in_degree[index] == 0)
        .map(UnitId)
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while !queue.is_empty() {
        let mut next_level = Vec::new();
        for _ in 0..queue.len() {
            let Some(current) = queue.pop_front() else {
                break;
            };
            order.push(current);
            for dependent in &dependents[current.0] {
                in_degree[dependent.0] -= 1;
                if in_degree[dependent.0] == 0 {
                    next_level.push(*dependent);
                }
            }
        }
        next_level.sort();
        queue.extend(next_level);
    }

    if order.len() != nodes.len() {
        let cycle = nodes
            .iter()
            .enumerate()
            .filter(|(index, _)| in_degree[*index] > 0)
            .map(|(_, node)| node.name.clone())
            .collect();
        return Err(GraphError::Invalid(vec![ValidationError::CyclicDependency {
            cycle,
        }]));
    }

    Ok(order)
}
