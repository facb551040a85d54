// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Small helpers the pipeline and its callers share.

mod filter_existing;
mod group_filter;
mod sync_gate;

pub use filter_existing::{row_key, FilterExisting};
pub use group_filter::CustomerGroupFilter;
pub use sync_gate::AttributeSyncGate;
