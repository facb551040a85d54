mod context;
mod graph;
mod status;
#[cfg(test)]
mod integration_tests;

pub use context::RunContext;
pub use graph::{UnitGraph, UnitGraphBuilder, UnitId, UnitRef, UnitResolver};
pub use status::UnitStatus;
