// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Remote object type written when the config does not name one.
pub const DEFAULT_OBJECT_TYPE: &str = "Account";
/// Offset used for plain `date` fields when no timezone is configured.
pub const DEFAULT_TIMEZONE: &str = "+00:00";
/// Default `tracing` filter for the binary when `RUST_LOG` is unset.
pub const DEFAULT_LOG_LEVEL: &str = "info";
