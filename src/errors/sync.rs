// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{GraphError, TransportError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format '{0}', expected .yaml, .yml or .toml")]
    UnsupportedFormat(String),

    #[error("Configuration validation failed:\n{0}")]
    Invalid(String),

    #[error("Invalid timezone offset '{0}', expected something like '+02:00'")]
    InvalidTimezone(String),
}

/// Error returned from a pipeline run.
///
/// Entity-level failures never surface here; they become `ERROR` statuses.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Unit '{unit}' failed: {message}")]
    Unit { unit: String, message: String },
}

impl SyncError {
    pub fn unit(unit: impl Into<String>, message: impl Into<String>) -> Self {
        SyncError::Unit {
            unit: unit.into(),
            message: message.into(),
        }
    }
}
