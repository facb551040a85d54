// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{Entity, EntityId};
use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EntityError {
    #[error("Entity {entity} is of type '{actual}', schema expects '{expected}'")]
    WrongType {
        entity: EntityId,
        expected: String,
        actual: String,
    },

    #[error("Entity {entity} carries attribute '{attribute}' not declared by schema '{entity_type}' v{version}")]
    UndeclaredAttribute {
        entity: EntityId,
        entity_type: String,
        version: u32,
        attribute: String,
    },
}

/// Fixed, versioned attribute set for one local entity type.
///
/// Loaders check entities against the schema up front so mapping rules only
/// ever read attributes that are known to exist for the type.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EntitySchema {
    pub entity_type: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub attributes: BTreeSet<String>,
}

fn default_version() -> u32 {
    1
}

impl EntitySchema {
    pub fn new<I, S>(entity_type: impl Into<String>, version: u32, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity_type: entity_type.into(),
            version,
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn declares(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn validate(&self, entity: &Entity) -> Result<(), EntityError> {
        if entity.entity_type != self.entity_type {
            return Err(EntityError::WrongType {
                entity: entity.id,
                expected: self.entity_type.clone(),
                actual: entity.entity_type.clone(),
            });
        }

        match entity.attributes.keys().find(|code| !self.declares(code)) {
            Some(attribute) => Err(EntityError::UndeclaredAttribute {
                entity: entity.id,
                entity_type: self.entity_type.clone(),
                version: self.version,
                attribute: attribute.clone(),
            }),
            None => Ok(()),
        }
    }
}
