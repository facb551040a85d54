// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod graph;
mod sync;
mod transport;

pub use config::ValidationError;
pub use graph::GraphError;
pub use sync::{ConfigError, SyncError};
pub use transport::TransportError;
