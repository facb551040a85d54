// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use std::collections::BTreeSet;

use crate::entity::Entity;
use crate::traits::LoadProvider;

pub const ORDER_RELATION: &str = "order";
pub const CUSTOMER_GROUP_ATTRIBUTE: &str = "customer_group_id";

/// Restricts a batch to entities whose order belongs to one of the allowed
/// customer groups. Without a configured set every entity is kept.
#[derive(Debug, Clone, Default)]
pub struct CustomerGroupFilter {
    groups: Option<BTreeSet<u64>>,
}

impl CustomerGroupFilter {
    pub fn new(groups: Option<BTreeSet<u64>>) -> Self {
        Self { groups }
    }

    pub fn keep(&self, entity: &Entity, provider: &dyn LoadProvider) -> bool {
        let Some(groups) = &self.groups else {
            return true;
        };

        provider
            .related(entity.id, ORDER_RELATION)
            .and_then(|order| order.attribute(CUSTOMER_GROUP_ATTRIBUTE).and_then(group_id))
            .is_some_and(|group| groups.contains(&group))
    }
}

fn group_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::InMemoryLoad;

    fn provider() -> InMemoryLoad {
        InMemoryLoad::new(vec![
            Entity::new(1, "customer"),
            Entity::new(2, "customer"),
            Entity::new(3, "customer"),
        ])
        .with_related(1, ORDER_RELATION, Entity::new(11, "order").with(CUSTOMER_GROUP_ATTRIBUTE, 1))
        .with_related(2, ORDER_RELATION, Entity::new(12, "order").with(CUSTOMER_GROUP_ATTRIBUTE, "2"))
    }

    #[test]
    fn test_no_configured_groups_keeps_all() {
        let filter = CustomerGroupFilter::default();
        assert!(filter.keep(&Entity::new(3, "customer"), &provider()));
    }

    #[test]
    fn test_keeps_only_configured_groups() {
        let filter = CustomerGroupFilter::new(Some([2].into_iter().collect()));
        let provider = provider();

        assert!(!filter.keep(&Entity::new(1, "customer"), &provider));
        assert!(filter.keep(&Entity::new(2, "customer"), &provider));
        assert!(!filter.keep(&Entity::new(3, "customer"), &provider));
    }
}
