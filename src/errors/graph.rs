// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration and programmer errors raised by the unit graph.
//!
//! None of these are recoverable at runtime: they mean the graph was wired
//! wrongly or a caller broke the force/restore protocol.

use super::ValidationError;
use crate::engine::UnitStatus;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("Unit graph is invalid: {}", format_validation(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Unit '{unit}' does not provide the {capability} capability")]
    MissingCapability {
        unit: String,
        capability: &'static str,
    },

    #[error("Unit '{0}' is currently processing and cannot be inspected")]
    UnitBusy(String),

    #[error("Unit '{unit}' is not complete (status {status:?})")]
    NotComplete { unit: String, status: UnitStatus },

    #[error("Cannot force status of '{requested}': '{active}' is already forced and nesting is not supported")]
    NestedForce { active: String, requested: String },

    #[error("restore_status('{0}') called without a matching force_status")]
    UnpairedRestore(String),

    #[error("Unit kind '{kind}' appears {count} times; exactly one '{kind}' unit is required")]
    AmbiguousKind { kind: &'static str, count: usize },
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
