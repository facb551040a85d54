// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability for the sync pipeline.
//!
//! All diagnostic and operational logging goes through the typed message
//! structs in [`messages`]. A message owns its wording, its level and its
//! structured fields, so call sites stay one line and log output stays
//! consistent across units.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::config` - configuration loading and validation
//! * `messages::engine` - unit graph runs and unit lifecycle
//! * `messages::lookup` - remote query and record matching
//! * `messages::upsert` - payload notices and the upsert call
//! * `messages::status` - status reconciliation and persistence
//!
//! # Usage
//!
//! ```rust
//! use entity_sync::entity::EntityId;
//! use entity_sync::observability::messages::lookup::RecordNotFound;
//! use entity_sync::observability::messages::StructuredLog;
//!
//! RecordNotFound { entity: EntityId(3) }.log();
//! ```

pub mod messages;

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies.
pub fn init_logging(default_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
