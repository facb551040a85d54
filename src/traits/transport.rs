// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::TransportError;
use crate::transport::{ObjectDescription, QueryInput, QueryOutput, UpsertRequest, UpsertResponse};

/// Executes query and upsert calls against the remote object store.
///
/// An `Err` means the whole call failed (connectivity, authentication) and
/// aborts the calling unit. Per-record rejections are reported inside the
/// returned [`UpsertResponse`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn query(&self, input: &QueryInput) -> Result<QueryOutput, TransportError>;

    async fn upsert(&self, request: &UpsertRequest) -> Result<UpsertResponse, TransportError>;
}

/// Source of remote schema facts, usually wrapped in a
/// [`SchemaRegistry`](crate::transport::SchemaRegistry).
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn describe(&self, object_type: &str) -> Result<ObjectDescription, TransportError>;
}
