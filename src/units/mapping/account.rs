// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

use super::{base_default, base_object, MappingProfile, MappingRule, ValueScope};
use crate::entity::{Entity, ScopeId};
use crate::errors::SyncError;
use crate::traits::LoadView;

/// Owner assigned to new accounts, per scope with a global fallback.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DefaultOwner {
    #[serde(default)]
    pub global: Option<String>,
    #[serde(default)]
    pub scopes: BTreeMap<u32, String>,
}

impl DefaultOwner {
    pub fn for_scope(&self, scope: Option<ScopeId>) -> Option<&str> {
        scope
            .and_then(|scope| self.scopes.get(&scope.0))
            .or(self.global.as_ref())
            .map(String::as_str)
    }
}

/// Mapping profile for customers synchronized as `Account`.
#[derive(Debug, Clone, Default)]
pub struct AccountProfile {
    default_owner: DefaultOwner,
}

impl AccountProfile {
    pub fn new(default_owner: DefaultOwner) -> Self {
        Self { default_owner }
    }
}

impl MappingProfile for AccountProfile {
    fn object_by_entity_type<'e>(
        &self,
        entity: &'e Entity,
        local_object: &str,
        load: &dyn LoadView,
    ) -> Option<Cow<'e, Entity>> {
        match local_object {
            "customer" => Some(Cow::Borrowed(entity)),
            "customer_address/billing" | "customer_address/shipping" => {
                load.related(entity.id, local_object).map(Cow::Owned)
            }
            other => base_object(entity, other, load),
        }
    }

    fn prepare_value(
        &self,
        object: &Entity,
        attribute: &str,
        scope: &ValueScope<'_>,
    ) -> Result<Option<Value>, SyncError> {
        if object.id == scope.entity.id && attribute.eq_ignore_ascii_case("sforce_id") {
            let id = scope.lookup_record()?.and_then(|record| record.id());
            return Ok(id.map(|id| Value::String(id.to_string())));
        }
        Ok(object.attribute(attribute).cloned())
    }

    fn default_value(&self, rule: &MappingRule, scope: &ValueScope<'_>) -> Option<Value> {
        if rule.remote_field.eq_ignore_ascii_case("OwnerId") {
            return self
                .default_owner
                .for_scope(scope.scope_id())
                .map(|owner| Value::String(owner.to_string()));
        }

        let default = base_default(rule);
        if default.is_none() && rule.remote_field.eq_ignore_ascii_case("Name") {
            let name = generate_company(scope.entity);
            return (!name.is_empty()).then_some(Value::String(name));
        }
        default
    }
}

/// Billing company of a customer, else its synthesized name.
pub fn company_by_customer(entity: &Entity, billing: Option<&Entity>) -> String {
    billing
        .and_then(|address| address.text("company"))
        .unwrap_or_else(|| generate_company(entity))
}

/// "first last", trimmed.
pub fn generate_company(entity: &Entity) -> String {
    let first = entity.text("firstname").unwrap_or_default();
    let last = entity.text("lastname").unwrap_or_default();
    format!("{first} {last}").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_company() {
        let entity = Entity::new(1, "customer")
            .with("firstname", " Ada ")
            .with("lastname", "Lovelace");
        assert_eq!(generate_company(&entity), "Ada Lovelace");
        assert_eq!(generate_company(&Entity::new(2, "customer").with("lastname", "Hopper")), "Hopper");
    }

    #[test]
    fn test_company_prefers_billing_address() {
        let entity = Entity::new(1, "customer")
            .with("firstname", "Ada")
            .with("lastname", "Lovelace");
        let billing = Entity::new(10, "customer_address").with("company", "Analytical Engines");
        let blank = Entity::new(11, "customer_address").with("company", "  ");

        assert_eq!(company_by_customer(&entity, Some(&billing)), "Analytical Engines");
        assert_eq!(company_by_customer(&entity, Some(&blank)), "Ada Lovelace");
        assert_eq!(company_by_customer(&entity, None), "Ada Lovelace");
    }

    #[test]
    fn test_default_owner_by_scope() {
        let owner = DefaultOwner {
            global: Some("005GLOBAL".into()),
            scopes: [(2, "005TWO".to_string())].into_iter().collect(),
        };
        assert_eq!(owner.for_scope(Some(ScopeId(2))), Some("005TWO"));
        assert_eq!(owner.for_scope(Some(ScopeId(3))), Some("005GLOBAL"));
        assert_eq!(owner.for_scope(None), Some("005GLOBAL"));
        assert_eq!(DefaultOwner::default().for_scope(None), None);
    }
}
