// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The pipeline stages.
//!
//! Standard layout, each arrow a dependency edge:
//!
//! ```text
//! load -> lookup -> mapping -> upsertInput -> upsertOutput -> status
//! ```
//!
//! Mapping, upsertInput and status also depend on load directly, which is how
//! load's per-entity veto reaches them.
//!
//! Lookup additionally holds a non-dependency reference to mapping so it can
//! select the remote fields mapping will later compare against.

pub mod load;
pub mod lookup;
pub mod mapping;
pub mod status;
pub mod upsert;

pub use load::LoadUnit;
pub use lookup::{AccountByContactLookup, AccountLookup, LookupStrategy, LookupUnit};
pub use mapping::{AccountProfile, MappingProfile, MappingRule, MappingUnit, MappingWhen};
pub use status::{QueueUpdate, StatusRecord, StatusUnit, SyncStatus};
pub use upsert::{UpsertInputUnit, UpsertOutputUnit, UpsertPayload};

/// Unit kind tags, as used in configuration and logs.
pub mod kinds {
    pub const LOAD: &str = "load";
    pub const LOOKUP: &str = "lookup";
    pub const MAPPING: &str = "mapping";
    pub const UPSERT_INPUT: &str = "upsert_input";
    pub const UPSERT_OUTPUT: &str = "upsert_output";
    pub const STATUS: &str = "status";
}
