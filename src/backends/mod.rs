// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Collaborator backends the pipeline can run against.
//!
//! # Available Backends
//!
//! ## Memory Backend
//! Everything held in process:
//! - **Load**: batch, relations, duplicates, scopes and a writable queue
//! - **Transport**: filter trees evaluated over stored records, upserts with
//!   generated ids and unique-field duplicate detection
//! - **Status store**: records every write
//! - **Use Case**: the `entity-sync` binary, fixtures, tests
//!
//! Real SOAP/REST transports and ORM-backed providers plug in behind the same
//! traits from [`crate::traits`].
//!
//! # Examples
//!
//! ```rust
//! use entity_sync::backends::memory::InMemoryLoad;
//! use entity_sync::entity::Entity;
//!
//! let load = InMemoryLoad::new(vec![Entity::new(1, "customer").with("email", "ada@example.com")])
//!     .with_related(1, "customer_address/billing", Entity::new(7, "customer_address"))
//!     .with_duplicates(1, &[2]);
//! # let _ = load;
//! ```

pub mod memory;
