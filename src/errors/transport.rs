// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Batch-level failure talking to the remote system.
///
/// Per-record rejections are not transport errors; they travel inside the
/// upsert outcome for the entity.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("Connection to remote system failed: {0}")]
    Connection(String),

    #[error("Authentication with remote system failed: {0}")]
    Authentication(String),

    #[error("Remote object type '{0}' is not described")]
    UnknownObjectType(String),

    #[error("Remote call rejected: {0}")]
    Rejected(String),
}
