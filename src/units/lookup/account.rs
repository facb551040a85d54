// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{LookupScope, LookupStrategy, PriorityTiers, SearchIndex};
use crate::entity::Entity;
use crate::transport::record::scalar_text;
use crate::transport::{Filter, QueryInput, QueryOutput, ID_FIELD};

const BY_ID: &str = "id";
const BY_EXTERNAL_ID: &str = "external";
const BY_NAME: &str = "name";

/// Finds `Account` records directly.
///
/// Priority 0 is an exact identity match: the entity's known remote id
/// (`sforce_id`) or its local id in the external id field. Priority 10 is a
/// case-insensitive account name match.
#[derive(Debug, Clone, Default)]
pub struct AccountLookup {
    external_id_field: Option<String>,
}

impl AccountLookup {
    pub fn new(external_id_field: Option<String>) -> Self {
        Self { external_id_field }
    }
}

impl LookupStrategy for AccountLookup {
    fn object_type(&self) -> &str {
        "Account"
    }

    fn build_query(&self, input: &mut QueryInput, entities: &[&Entity], scope: &LookupScope<'_>) {
        input.select(ID_FIELD);
        input.select("OwnerId");
        input.select("Name");
        if let Some(field) = &self.external_id_field {
            input.select(field.as_str());
        }

        for entity in entities {
            let mut parts = Vec::new();
            if let Some(remote_id) = entity.text("sforce_id") {
                parts.push(Filter::eq(ID_FIELD, remote_id));
            }
            if let Some(field) = &self.external_id_field {
                parts.push(Filter::eq(field.as_str(), entity.id.0.to_string()));
            }
            let name = scope.company_name(entity);
            if !name.is_empty() {
                parts.push(Filter::is_in("Name", [name]));
            }

            match parts.len() {
                0 => {}
                1 => input.add_fragment(entity.id, parts.remove(0)),
                _ => input.add_fragment(entity.id, Filter::or(parts)),
            }
        }
    }

    fn collect_index(&self, output: &QueryOutput) -> SearchIndex {
        let mut index = SearchIndex::default();
        for (row, record) in output.iter() {
            if let Some(id) = record.id() {
                index.insert(BY_ID, id, row);
            }
            if let Some(external) = self
                .external_id_field
                .as_deref()
                .and_then(|field| record.get(field))
                .and_then(scalar_text)
            {
                index.insert(BY_EXTERNAL_ID, &external, row);
            }
            if let Some(name) = record.get("Name").and_then(scalar_text) {
                index.insert(BY_NAME, &name, row);
            }
        }
        index
    }

    fn search_priority_order(
        &self,
        index: &SearchIndex,
        entity: &Entity,
        scope: &LookupScope<'_>,
    ) -> PriorityTiers {
        let mut tiers = PriorityTiers::new();

        let mut exact: Vec<usize> = Vec::new();
        if let Some(remote_id) = entity.text("sforce_id") {
            exact.extend(index.rows(BY_ID, &remote_id));
        }
        if self.external_id_field.is_some() {
            for row in index.rows(BY_EXTERNAL_ID, &entity.id.0.to_string()) {
                if !exact.contains(row) {
                    exact.push(*row);
                }
            }
        }
        if !exact.is_empty() {
            tiers.insert(0, exact);
        }

        let by_name = index.rows(BY_NAME, &scope.company_name(entity));
        if !by_name.is_empty() {
            tiers.insert(10, by_name.to_vec());
        }
        tiers
    }
}
