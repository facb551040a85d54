// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::EntityId;
use std::collections::BTreeMap;

/// Identity-keyed associative store for per-entity results.
///
/// Writes are insert-or-overwrite; there is no partial in-place update visible
/// to other units. Iteration is ordered by entity id so logs and payloads are
/// deterministic.
#[derive(Debug, Clone)]
pub struct EntityStore<T>(BTreeMap<EntityId, T>);

impl<T> EntityStore<T> {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, entity: EntityId, value: T) -> Option<T> {
        self.0.insert(entity, value)
    }

    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.0.get(&entity)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.0.contains_key(&entity)
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.0.remove(&entity)
    }

    pub fn get_or_insert_with(&mut self, entity: EntityId, f: impl FnOnce() -> T) -> &mut T {
        self.0.entry(entity).or_insert_with(f)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.0.iter().map(|(id, value)| (*id, value))
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.0.keys().copied()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(EntityId, T)> for EntityStore<T> {
    fn from_iter<I: IntoIterator<Item = (EntityId, T)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
