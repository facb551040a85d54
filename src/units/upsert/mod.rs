// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Building write payloads and submitting them.

pub mod fields;
mod input;
mod output;

pub use input::{UpsertInputUnit, UpsertPayload, UP_TO_DATE_MESSAGE};
pub use output::UpsertOutputUnit;
