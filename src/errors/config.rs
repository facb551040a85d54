// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur during unit graph validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A circular dependency was detected in the unit graph
    CyclicDependency {
        /// The cycle path showing the circular dependency
        cycle: Vec<String>,
    },
    /// A unit references a dependency that doesn't exist
    UnresolvedDependency {
        /// The unit that has the unresolved dependency
        unit_id: String,
        /// The dependency that couldn't be resolved
        missing_dependency: String,
    },
    /// Two units were registered under the same name
    DuplicateUnitId {
        /// The duplicate unit name
        unit_id: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedDependency {
                unit_id,
                missing_dependency,
            } => {
                write!(
                    f,
                    "Unit '{}' depends on '{}' which does not exist",
                    unit_id, missing_dependency
                )
            }
            ValidationError::DuplicateUnitId { unit_id } => {
                write!(f, "Duplicate unit ID: '{}'", unit_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
