// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod runtime;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, standard_units, LookupConfig, LookupStrategyKind,
    SyncConfig, UnitConfig,
};
pub use runtime::{Collaborators, ReportEntry, RunReport, SyncPipeline};
pub use validation::{validate_dependency_graph, UnitSpec};
