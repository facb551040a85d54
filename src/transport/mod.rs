// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Wire-independent shapes of the remote calls: query, upsert and describe.
//!
//! The transport itself is an external collaborator (see
//! [`crate::traits::Transport`]); this module only defines what flows across it.

pub mod query;
pub mod record;
pub mod schema;
pub mod upsert;

pub use query::{Filter, Operator, QueryInput, QueryOutput};
pub use record::{values_match, RemoteRecord, ID_FIELD};
pub use schema::{FieldDescriptor, FieldType, ObjectDescription, SchemaRegistry};
pub use upsert::{
    FieldValues, RemoteError, UpsertOutcome, UpsertRequest, UpsertResponse, DUPLICATE_VALUE,
};
