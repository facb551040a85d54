// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::entity::Entity;
use crate::traits::SyncGate;

/// Reads the disabled flag straight from a local entity attribute.
#[derive(Debug, Clone)]
pub struct AttributeSyncGate {
    attribute: String,
}

impl AttributeSyncGate {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
        }
    }
}

impl SyncGate for AttributeSyncGate {
    fn is_sync_disabled(&self, entity: &Entity) -> bool {
        entity.flag(&self.attribute)
    }
}
