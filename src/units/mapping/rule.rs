// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// When a rule is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingWhen {
    /// Only when creating a remote record.
    Insert,
    /// Only when updating an existing remote record.
    Update,
    #[default]
    Upsert,
}

/// One local attribute to remote field mapping.
///
/// `local_object` names where the attribute is read from: the entity itself
/// (`customer`) or a related object (`customer_address/billing`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub local_object: String,
    pub local_attribute: String,
    pub remote_field: String,
    #[serde(default)]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub when: MappingWhen,
    #[serde(default)]
    pub required: bool,
}

impl MappingRule {
    pub fn new(
        local_object: impl Into<String>,
        local_attribute: impl Into<String>,
        remote_field: impl Into<String>,
    ) -> Self {
        Self {
            local_object: local_object.into(),
            local_attribute: local_attribute.into(),
            remote_field: remote_field.into(),
            default_value: None,
            when: MappingWhen::Upsert,
            required: false,
        }
    }

    pub fn when(mut self, when: MappingWhen) -> Self {
        self.when = when;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Whether the rule is part of the update (`true`) or insert rule set.
    pub fn applies(&self, update: bool) -> bool {
        match self.when {
            MappingWhen::Upsert => true,
            MappingWhen::Update => update,
            MappingWhen::Insert => !update,
        }
    }
}
