// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{LookupScope, LookupStrategy, PriorityTiers, SearchIndex};
use crate::entity::Entity;
use crate::transport::record::scalar_text;
use crate::transport::{Filter, QueryInput, QueryOutput, RemoteRecord, ID_FIELD};

const BY_EXTERNAL_ID: &str = "external";
const BY_EMAIL_AND_WEBSITE: &str = "email_website";
const BY_EMAIL: &str = "email";

/// Finds the `Account` of an existing `Contact`.
///
/// Queries contacts that have an account, ranks them by external id (0),
/// email within the entity's website (10), then email alone (20), and caches
/// the contact's account rather than the contact.
#[derive(Debug, Clone)]
pub struct AccountByContactLookup {
    external_id_field: String,
    website_field: String,
}

impl AccountByContactLookup {
    pub fn new(external_id_field: impl Into<String>, website_field: impl Into<String>) -> Self {
        Self {
            external_id_field: external_id_field.into(),
            website_field: website_field.into(),
        }
    }

    fn website(entity: &Entity, scope: &LookupScope<'_>) -> String {
        scope
            .load
            .related(entity.id, "website")
            .and_then(|website| website.text("salesforce_id"))
            .unwrap_or_default()
    }

    fn email(entity: &Entity) -> Option<String> {
        entity.text("email").map(|email| email.to_lowercase())
    }
}

impl LookupStrategy for AccountByContactLookup {
    fn object_type(&self) -> &str {
        "Contact"
    }

    fn build_query(&self, input: &mut QueryInput, entities: &[&Entity], scope: &LookupScope<'_>) {
        for column in [
            ID_FIELD,
            "Email",
            self.external_id_field.as_str(),
            self.website_field.as_str(),
            "Account.Id",
            "Account.OwnerId",
            "Account.Name",
        ] {
            input.select(column);
        }

        for entity in entities {
            let mut identity = Vec::new();
            if let Some(email) = Self::email(entity) {
                let website = Self::website(entity, scope);
                let mut websites = vec![String::new()];
                if !website.is_empty() {
                    websites.push(website);
                }
                identity.push(Filter::and(vec![
                    Filter::is_in("Email", [email]),
                    Filter::is_in(self.website_field.as_str(), websites),
                ]));
            }
            identity.push(Filter::is_in(
                self.external_id_field.as_str(),
                [entity.id.0.to_string()],
            ));

            input.add_fragment(entity.id, Filter::or(identity));
            input.add_fragment(entity.id, Filter::ne("AccountId", ""));
        }
    }

    fn collect_index(&self, output: &QueryOutput) -> SearchIndex {
        let mut index = SearchIndex::default();
        for (row, record) in output.iter() {
            if let Some(external) = record.get(&self.external_id_field).and_then(scalar_text) {
                index.insert(BY_EXTERNAL_ID, &external, row);
            }
            if let Some(email) = record.get("Email").and_then(scalar_text) {
                index.insert(BY_EMAIL, &email, row);
                if let Some(website) = record
                    .get(&self.website_field)
                    .and_then(scalar_text)
                    .filter(|w| !w.is_empty())
                {
                    index.insert(BY_EMAIL_AND_WEBSITE, &format!("{email}|{website}"), row);
                }
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

        let by_external = index.rows(BY_EXTERNAL_ID, &entity.id.0.to_string());
        if !by_external.is_empty() {
            tiers.insert(0, by_external.to_vec());
        }

        if let Some(email) = Self::email(entity) {
            let website = Self::website(entity, scope);
            if !website.is_empty() {
                let rows = index.rows(BY_EMAIL_AND_WEBSITE, &format!("{email}|{website}"));
                if !rows.is_empty() {
                    tiers.insert(10, rows.to_vec());
                }
            }
            let rows = index.rows(BY_EMAIL, &email);
            if !rows.is_empty() {
                tiers.insert(20, rows.to_vec());
            }
        }
        tiers
    }

    fn prepare_record(&self, record: &RemoteRecord) -> Option<RemoteRecord> {
        record.sub_record("Account")
    }

    fn mapped_column(&self, field: &str) -> String {
        format!("Account.{field}")
    }
}
