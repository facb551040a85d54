// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a unit within one graph.
///
/// Transitions only move forward (`Pending -> Processing -> Complete | Error`,
/// or `Pending -> Skipped`). Readers may see a different status through a
/// forced override, but the stored status never changes because of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitStatus {
    Pending,
    Processing,
    Complete,
    Skipped,
    Error,
}

impl UnitStatus {
    /// Complete or skipped: dependents may proceed and the unit is memoized.
    pub fn is_finished(self) -> bool {
        matches!(self, UnitStatus::Complete | UnitStatus::Skipped)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UnitStatus::Pending => "PENDING",
            UnitStatus::Processing => "PROCESSING",
            UnitStatus::Complete => "COMPLETE",
            UnitStatus::Skipped => "SKIPPED",
            UnitStatus::Error => "ERROR",
        };
        f.write_str(label)
    }
}
