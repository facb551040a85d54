// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Every diagnostic the pipeline emits is a small struct implementing
//! `Display` for the human-readable line and [`StructuredLog`] for the
//! structured fields and level. Units never format log lines inline.
//!
//! # Organization
//!
//! * `config` - configuration loading and validation
//! * `engine` - unit graph run and unit lifecycle
//! * `lookup` - remote query and record matching
//! * `upsert` - payload construction and the upsert call
//! * `status` - status reconciliation and persistence
//!
//! # Usage Pattern
//!
//! ```rust
//! use entity_sync::observability::messages::lookup::LookupSkipped;
//! use entity_sync::observability::messages::StructuredLog;
//!
//! LookupSkipped { object_type: "Account" }.log();
//! ```

use tracing::Span;

pub mod config;
pub mod engine;
pub mod lookup;
pub mod status;
pub mod upsert;

/// A message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
