//! Structural validation for unit dependency graphs.
//!
//! Both the configuration loader and [`UnitGraphBuilder`](crate::engine::UnitGraphBuilder)
//! run these checks, in this order:
//!
//! 1. **Uniqueness**: every unit name appears once
//! 2. **References**: every `depends_on` entry names a registered unit
//! 3. **Cycles**: DFS with a recursion stack, reporting the cycle path
//!
//! Cycle detection needs a structurally valid graph, so it only runs when the
//! first two checks pass.
//!
//! # Example
//! ```rust
//! use entity_sync::config::{validate_dependency_graph, UnitSpec};
//! use entity_sync::errors::ValidationError;
//!
//! let units = vec![
//!     UnitSpec::new("load", &[]),
//!     UnitSpec::new("lookup", &["load", "status"]),
//!     UnitSpec::new("status", &["lookup"]),
//! ];
//!
//! let errors = validate_dependency_graph(&units).unwrap_err();
//! assert!(matches!(errors[0], ValidationError::CyclicDependency { .. }));
//! ```

use crate::errors::ValidationError;
use std::collections::{HashMap, HashSet};

/// Name and dependency names of one unit, as seen by validation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSpec {
    pub id: String,
    pub depends_on: Vec<String>,
}

impl UnitSpec {
    pub fn new(id: &str, depends_on: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Validates a unit graph, accumulating every error found.
///
/// # Returns
///
/// * `Ok(())` - Graph is valid and can be ordered
/// * `Err(Vec<ValidationError>)` - All validation errors found
pub fn validate_dependency_graph(units: &[UnitSpec]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_unit_ids(units) {
        errors.extend(duplicate_errors);
    }

    if let Err(unresolved_errors) = validate_dependency_references(units) {
        errors.extend(unresolved_errors);
    }

    // Cycle detection needs every edge to resolve
    if errors.is_empty() {
        if let Err(cycle_errors) = validate_acyclic_graph(units) {
            errors.extend(cycle_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_unit_ids(units: &[UnitSpec]) -> Result<(), Vec<ValidationError>> {
    let mut seen_ids = HashSet::new();
    let errors: Vec<ValidationError> = units
        .iter()
        .filter(|unit| !seen_ids.insert(unit.id.as_str()))
        .map(|unit| ValidationError::DuplicateUnitId {
            unit_id: unit.id.clone(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_dependency_references(units: &[UnitSpec]) -> Result<(), Vec<ValidationError>> {
    let unit_ids: HashSet<&str> = units.iter().map(|u| u.id.as_str()).collect();
    let mut errors = Vec::new();

    for unit in units {
        for dependency in &unit.depends_on {
            if !unit_ids.contains(dependency.as_str()) {
                errors.push(ValidationError::UnresolvedDependency {
                    unit_id: unit.id.clone(),
                    missing_dependency: dependency.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// DFS over the forward graph (dependency -> dependents). Meeting a node that
/// is still on the recursion stack closes a cycle.
fn validate_acyclic_graph(units: &[UnitSpec]) -> Result<(), Vec<ValidationError>> {
    let mut graph: HashMap<&str, Vec<&str>> = HashMap::new();
    for unit in units {
        graph.entry(unit.id.as_str()).or_default();
    }
    for unit in units {
        for dependency in &unit.depends_on {
            graph
                .entry(dependency.as_str())
                .or_default()
                .push(unit.id.as_str());
        }
    }

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    let mut path = Vec::new();

    // Walk in declaration order so the reported cycle is deterministic
    for unit in units {
        if !visited.contains(unit.id.as_str()) {
            if let Some(cycle) =
                dfs_cycle_detection(&unit.id, &graph, &mut visited, &mut rec_stack, &mut path)
            {
                return Err(vec![ValidationError::CyclicDependency { cycle }]);
            }
        }
    }

    Ok(())
}

fn dfs_cycle_detection<'a>(
    node: &'a str,
    graph: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    rec_stack: &mut HashSet<&'a str>,
    path: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    visited.insert(node);
    rec_stack.insert(node);
    path.push(node);

    if let Some(neighbors) = graph.get(node) {
        for &neighbor in neighbors {
            if !visited.contains(neighbor) {
                if let Some(cycle) = dfs_cycle_detection(neighbor, graph, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(neighbor) {
                let cycle_start = path.iter().position(|x| *x == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> = path[cycle_start..].iter().map(|s| s.to_string()).collect();
                cycle.push(neighbor.to_string());
                return Some(cycle);
            }
        }
    }

    rec_stack.remove(node);
    path.pop();
    None
}
