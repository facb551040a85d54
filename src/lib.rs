// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // in-memory collaborators
pub mod config;     // config + pipeline facade
pub mod engine;     // unit graph
pub mod entity;     // local entities and stores
pub mod errors;     // error handling
pub mod observability;
pub mod services;   // queue and batch helpers
pub mod traits;     // collaborator and unit abstractions
pub mod transport;  // remote call shapes
pub mod units;      // pipeline stages
