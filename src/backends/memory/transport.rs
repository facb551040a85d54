// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

use crate::entity::EntityId;
use crate::errors::TransportError;
use crate::traits::{SchemaSource, Transport};
use crate::transport::{
    values_match, FieldValues, ObjectDescription, QueryInput, QueryOutput, RemoteError,
    RemoteRecord, UpsertOutcome, UpsertRequest, UpsertResponse, DUPLICATE_VALUE, ID_FIELD,
};

/// Remote system held in memory.
///
/// Queries evaluate the batch filter over the stored records of the object
/// type and project the selected columns, dotted columns into nested
/// relations. Upserts update by `Id` or create with a generated id, and
/// reject values that collide on a unique field.
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    state: Mutex<RemoteState>,
    descriptions: BTreeMap<String, ObjectDescription>,
    unique_fields: BTreeMap<String, Vec<String>>,
    deferred: HashSet<EntityId>,
}

#[derive(Debug, Default)]
struct RemoteState {
    records: BTreeMap<String, Vec<RemoteRecord>>,
    next_id: u64,
    failure: Option<TransportError>,
    queries: Vec<QueryInput>,
    requests: Vec<UpsertRequest>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: ObjectDescription) -> Self {
        self.descriptions.insert(description.name.clone(), description);
        self
    }

    pub fn with_record(self, object_type: &str, record: RemoteRecord) -> Self {
        self.with_records(object_type, vec![record])
    }

    pub fn with_records(mut self, object_type: &str, records: Vec<RemoteRecord>) -> Self {
        self.state
            .get_mut()
            .records
            .entry(object_type.to_string())
            .or_default()
            .extend(records);
        self
    }

    /// Values of `field` must be unique among records of `object_type`.
    pub fn with_unique_field(mut self, object_type: &str, field: &str) -> Self {
        self.unique_fields
            .entry(object_type.to_string())
            .or_default()
            .push(field.to_string());
        self
    }

    /// Answer upserts for `entity` as accepted but not yet applied.
    pub fn with_deferred(mut self, entity: u64) -> Self {
        self.deferred.insert(EntityId(entity));
        self
    }

    /// Fail every following call with `failure`; `None` heals the transport.
    pub async fn set_failure(&self, failure: Option<TransportError>) {
        self.state.lock().await.failure = failure;
    }

    pub async fn records(&self, object_type: &str) -> Vec<RemoteRecord> {
        self.state
            .lock()
            .await
            .records
            .get(object_type)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn queries(&self) -> Vec<QueryInput> {
        self.state.lock().await.queries.clone()
    }

    pub async fn requests(&self) -> Vec<UpsertRequest> {
        self.state.lock().await.requests.clone()
    }

    fn key_prefix(object_type: &str) -> &'static str {
        match object_type {
            "Account" => "001",
            "Contact" => "003",
            "Opportunity" => "006",
            _ => "a00",
        }
    }

    fn unique_conflict(
        &self,
        object_type: &str,
        records: &[RemoteRecord],
        own_id: Option<&str>,
        fields: &FieldValues,
    ) -> Option<RemoteError> {
        let unique = self.unique_fields.get(object_type)?;
        for field in unique {
            let Some(value) = fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(field))
                .map(|(_, value)| value)
                .filter(|value| !value.is_null())
            else {
                continue;
            };
            let clash = records.iter().find(|record| {
                record.id() != own_id
                    && record
                        .get(field)
                        .is_some_and(|existing| values_match(existing, value))
            });
            if let Some(clash) = clash {
                return Some(RemoteError::new(
                    DUPLICATE_VALUE,
                    format!(
                        "duplicate value found: {} duplicates value on record with id: {}",
                        field,
                        clash.id().unwrap_or_default()
                    ),
                ));
            }
        }
        None
    }
}

/// Keep only `columns`; `Parent.Field` columns land in a nested `Parent` object.
fn project(record: &RemoteRecord, columns: &[String]) -> RemoteRecord {
    if columns.is_empty() {
        return record.clone();
    }

    let mut projected = RemoteRecord::new();
    for column in columns {
        let Some(value) = record.get_path(column) else {
            continue;
        };
        match column.split_once('.') {
            Some((relation, field)) => {
                let nested = projected
                    .0
                    .entry(relation.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(nested) = nested {
                    nested.insert(field.to_string(), value.clone());
                }
            }
            None => projected.insert(column.clone(), value.clone()),
        }
    }
    projected
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn query(&self, input: &QueryInput) -> Result<QueryOutput, TransportError> {
        let mut state = self.state.lock().await;
        if let Some(failure) = &state.failure {
            return Err(failure.clone());
        }
        state.queries.push(input.clone());

        let Some(filter) = input.filter() else {
            return Ok(QueryOutput::default());
        };
        let rows = state
            .records
            .get(&input.from)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| filter.matches(record))
                    .map(|record| project(record, input.columns()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(QueryOutput(rows))
    }

    async fn upsert(&self, request: &UpsertRequest) -> Result<UpsertResponse, TransportError> {
        let mut state = self.state.lock().await;
        if let Some(failure) = &state.failure {
            return Err(failure.clone());
        }
        state.requests.push(request.clone());
        let state = &mut *state;

        let prefix = Self::key_prefix(&request.object_type);
        let mut response = UpsertResponse::new();

        for (entity, fields) in request.payloads.iter() {
            if self.deferred.contains(&entity) {
                response.insert(entity, UpsertOutcome::waiting());
                continue;
            }

            let records = state
                .records
                .entry(request.object_type.clone())
                .or_default();
            let id = fields
                .get(ID_FIELD)
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_string);

            if let Some(error) =
                self.unique_conflict(&request.object_type, records, id.as_deref(), fields)
            {
                response.insert(entity, UpsertOutcome::failed(vec![error]));
                continue;
            }

            let outcome = match id {
                Some(id) => match records.iter_mut().find(|r| r.id() == Some(id.as_str())) {
                    Some(record) => {
                        for (name, value) in fields {
                            record.insert(name.clone(), value.clone());
                        }
                        UpsertOutcome::succeeded(record.clone())
                    }
                    None => UpsertOutcome::failed(vec![RemoteError::new(
                        "ENTITY_IS_DELETED",
                        format!("entity is deleted: {}", id),
                    )]),
                },
                None => {
                    state.next_id += 1;
                    let mut record = RemoteRecord(fields.clone());
                    record.insert(
                        ID_FIELD,
                        Value::String(format!("{}{:012}", prefix, state.next_id)),
                    );
                    let outcome = UpsertOutcome::succeeded(record.clone());
                    state
                        .records
                        .entry(request.object_type.clone())
                        .or_default()
                        .push(record);
                    outcome
                }
            };
            response.insert(entity, outcome);
        }

        Ok(response)
    }
}

#[async_trait]
impl SchemaSource for InMemoryTransport {
    async fn describe(&self, object_type: &str) -> Result<ObjectDescription, TransportError> {
        if let Some(failure) = &self.state.lock().await.failure {
            return Err(failure.clone());
        }
        self.descriptions
            .get(object_type)
            .cloned()
            .ok_or_else(|| TransportError::UnknownObjectType(object_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Filter;
    use serde_json::json;

    fn remote() -> InMemoryTransport {
        InMemoryTransport::new()
            .with_records(
                "Contact",
                vec![
                    serde_json::from_value(json!({
                        "Id": "003A",
                        "Email": "ada@example.com",
                        "AccountId": "001A",
                        "Account": { "Id": "001A", "Name": "Analytical Engines", "OwnerId": "005A" }
                    }))
                    .unwrap(),
                    serde_json::from_value(json!({ "Id": "003B", "Email": "grace@example.com", "AccountId": "" }))
                        .unwrap(),
                ],
            )
            .with_record("Account", RemoteRecord::new().with("Id", "001A").with("Name", "Analytical Engines"))
            .with_unique_field("Account", "Name")
    }

    #[tokio::test]
    async fn test_query_filters_and_projects_relations() {
        let mut input = QueryInput::new("Contact");
        input.select("Id");
        input.select("Account.Name");
        input.add_fragment(
            EntityId(1),
            Filter::and(vec![Filter::eq("Email", "ADA@example.com"), Filter::ne("AccountId", "")]),
        );

        let output = remote().query(&input).await.unwrap();

        assert_eq!(output.len(), 1);
        let row = output.get(0).unwrap();
        assert_eq!(row.id(), Some("003A"));
        assert_eq!(row.get_path("Account.Name"), Some(&json!("Analytical Engines")));
        assert!(row.get("Email").is_none());
    }

    #[tokio::test]
    async fn test_query_without_fragments_returns_nothing() {
        let output = remote().query(&QueryInput::new("Contact")).await.unwrap();
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_creates_updates_and_detects_duplicates() {
        let transport = remote();
        let mut request = UpsertRequest::new("Account");
        request.payloads.insert(
            EntityId(1),
            json!({ "Id": "001A", "Phone": "555-0100" }).as_object().unwrap().clone(),
        );
        request.payloads.insert(
            EntityId(2),
            json!({ "Name": "Difference Engines" }).as_object().unwrap().clone(),
        );
        request.payloads.insert(
            EntityId(3),
            json!({ "Name": "analytical engines" }).as_object().unwrap().clone(),
        );

        let response = transport.upsert(&request).await.unwrap();

        assert!(response.get(EntityId(1)).unwrap().success);
        let created = response.get(EntityId(2)).unwrap();
        assert!(created.success);
        assert_eq!(created.record.as_ref().and_then(RemoteRecord::id), Some("001000000000001"));
        let rejected = response.get(EntityId(3)).unwrap();
        assert!(rejected.has_error_code(DUPLICATE_VALUE));

        let accounts = transport.records("Account").await;
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].get("Phone"), Some(&json!("555-0100")));
    }

    #[tokio::test]
    async fn test_failure_toggle_fails_every_call() {
        let transport = remote();
        transport
            .set_failure(Some(TransportError::Connection("timed out".into())))
            .await;

        assert!(transport.describe("Account").await.is_err());
        assert!(transport.upsert(&UpsertRequest::new("Account")).await.is_err());

        transport.set_failure(None).await;
        assert!(matches!(
            transport.describe("Account").await,
            Err(TransportError::UnknownObjectType(_))
        ));
    }
}
