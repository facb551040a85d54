// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Whole-pipeline scenarios over the in-memory backends.

use async_trait::async_trait;
use std::sync::Arc;

use crate::backends::memory::{InMemoryLoad, InMemoryTransport, RecordingStatusStore, SavedStatus};
use crate::config::{Collaborators, SyncConfig, SyncPipeline};
use crate::engine::{UnitGraph, UnitGraphBuilder, UnitStatus};
use crate::entity::{Entity, EntityId, ScopeId};
use crate::errors::{SyncError, TransportError};
use crate::traits::{LoadProvider, Transport};
use crate::transport::{
    FieldDescriptor, FieldType, ObjectDescription, QueryInput, QueryOutput, RemoteRecord,
    SchemaRegistry, UpsertOutcome, UpsertRequest, UpsertResponse,
};
use crate::units::lookup::LookupOptions;
use crate::units::upsert::UP_TO_DATE_MESSAGE;
use crate::units::{
    AccountLookup, AccountProfile, LoadUnit, LookupUnit, MappingRule, MappingUnit, StatusUnit,
    SyncStatus, UpsertInputUnit, UpsertOutputUnit,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account_description() -> ObjectDescription {
        ObjectDescription {
            name: "Account".into(),
            fields: vec![
                FieldDescriptor::new("Id", FieldType::Id).read_only(),
                FieldDescriptor::new("Name", FieldType::String).with_length(255),
                FieldDescriptor::new("Phone", FieldType::Phone),
                FieldDescriptor::new("Email__c", FieldType::Email),
                FieldDescriptor::new("OwnerId", FieldType::Reference),
            ],
        }
    }

    fn customer(id: u64, first: &str, last: &str, email: &str) -> Entity {
        let entity = Entity::new(id, "customer")
            .with("firstname", first)
            .with("lastname", last)
            .with("telephone", format!("555-01{:02}", id));
        if email.is_empty() {
            entity
        } else {
            entity.with("email", email)
        }
    }

    const CONFIG: &str = r#"
object_type: Account
default_owner:
  global: "005000000000001"
sync_disabled_attribute: sync_disabled
mapping:
  - { local_object: customer_address/billing, local_attribute: company, remote_field: Name }
  - { local_object: customer, local_attribute: telephone, remote_field: Phone }
  - { local_object: customer, local_attribute: email, remote_field: Email__c, required: true }
  - { local_object: customer, local_attribute: owner, remote_field: OwnerId, when: insert }
"#;

    fn pipeline(
        yaml: &str,
        load: Arc<InMemoryLoad>,
        remote: Arc<InMemoryTransport>,
        store: Arc<RecordingStatusStore>,
    ) -> SyncPipeline {
        let config: SyncConfig = serde_yaml::from_str(yaml).unwrap();
        let collaborators =
            Collaborators::new(load, remote.clone(), remote).with_status_store(store);
        SyncPipeline::from_config(&config, collaborators).unwrap()
    }

    /// Answers every query from the wrapped remote, but reports success only
    /// for the listed entities and says nothing about the rest.
    struct SuccessOnly {
        remote: Arc<InMemoryTransport>,
        succeed: Vec<u64>,
    }

    #[async_trait]
    impl Transport for SuccessOnly {
        async fn query(&self, input: &QueryInput) -> Result<QueryOutput, TransportError> {
            self.remote.query(input).await
        }

        async fn upsert(&self, request: &UpsertRequest) -> Result<UpsertResponse, TransportError> {
            Ok(request
                .payloads
                .iter()
                .filter(|(entity, _)| self.succeed.contains(&entity.0))
                .map(|(entity, fields)| (entity, UpsertOutcome::succeeded(RemoteRecord(fields.clone()))))
                .collect())
        }
    }

    fn standard_graph(
        load: Arc<InMemoryLoad>,
        remote: Arc<InMemoryTransport>,
        transport: Arc<dyn Transport>,
        store: Arc<RecordingStatusStore>,
    ) -> UnitGraph {
        let schema = Arc::new(SchemaRegistry::new(remote));
        let options = LookupOptions {
            object_type: "Account".into(),
            ..Default::default()
        };
        let rules = vec![
            MappingRule::new("customer_address/billing", "company", "Name"),
            MappingRule::new("customer", "telephone", "Phone"),
        ];

        UnitGraphBuilder::new()
            .unit("load", &[], Box::new(LoadUnit::new(load)))
            .unit(
                "lookup",
                &["load"],
                Box::new(
                    LookupUnit::new(AccountLookup::new(None), transport.clone(), schema.clone(), options, "load")
                        .with_mapping("mapping"),
                ),
            )
            .unit(
                "mapping",
                &["load", "lookup"],
                Box::new(MappingUnit::new(rules, Box::new(AccountProfile::default()), "load", "lookup")),
            )
            .unit(
                "upsertInput",
                &["load", "mapping"],
                Box::new(UpsertInputUnit::new("Account", schema, "load", "mapping")),
            )
            .unit(
                "upsertOutput",
                &["upsertInput"],
                Box::new(UpsertOutputUnit::new(transport, "upsertInput", "lookup")),
            )
            .unit(
                "status",
                &["load", "upsertOutput"],
                Box::new(StatusUnit::new("load", "upsertOutput").with_store(store)),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_id_match_name_match_and_no_match() {
        let remote = Arc::new(
            InMemoryTransport::new()
                .with_description(account_description())
                .with_record("Account", RemoteRecord::new().with("Id", "001A").with("Name", "Analytical Engines"))
                .with_record("Account", RemoteRecord::new().with("Id", "001G").with("Name", "grace hopper")),
        );
        let load = Arc::new(InMemoryLoad::new(vec![
            customer(1, "Ada", "Lovelace", "ada@example.com").with("sforce_id", "001A"),
            customer(2, "Grace", "Hopper", "grace@example.com"),
            customer(3, "Nobody", "Known", "nobody@example.com"),
        ]));
        let transport = Arc::new(SuccessOnly {
            remote: remote.clone(),
            succeed: vec![1, 2],
        });
        let store = Arc::new(RecordingStatusStore::new());

        let mut graph = standard_graph(load.clone(), remote.clone(), transport, store.clone());
        graph.run_named("status").await.unwrap();

        let lookup = graph.inspect(graph.unit_id("lookup").unwrap()).unwrap().as_lookup().unwrap();
        assert_eq!(lookup.record(EntityId(1)).and_then(RemoteRecord::id), Some("001A"));
        assert_eq!(lookup.record(EntityId(2)).and_then(RemoteRecord::id), Some("001G"));
        assert!(lookup.record(EntityId(3)).is_none());
        assert!(lookup.records(EntityId(3)).is_empty());

        let status = graph.inspect(graph.unit_id("status").unwrap()).unwrap().as_status().unwrap();
        let resolved: Vec<SyncStatus> = (1..=3)
            .map(|id| status.status(EntityId(id)).unwrap().status)
            .collect();
        assert_eq!(
            resolved,
            vec![SyncStatus::Complete, SyncStatus::Complete, SyncStatus::Skipped]
        );

        assert_eq!(load.queue(EntityId(3)).map(|q| q.status), Some(SyncStatus::Skipped));
        let saved: Vec<u64> = store.saved().await.iter().map(|s| s.entity.0).collect();
        assert_eq!(saved, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_lookup_selects_mapped_fields() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let mut graph = standard_graph(load, remote.clone(), remote.clone(), store);
        graph.run_named("status").await.unwrap();

        let queries = remote.queries().await;
        assert_eq!(queries.len(), 1);
        let columns = queries[0].columns();
        assert!(columns.iter().any(|c| c == "Phone"));
        assert_eq!(columns.iter().filter(|c| c.eq_ignore_ascii_case("Name")).count(), 1);
        assert!(!columns.iter().any(|c| c == "Email__c"));
    }

    #[tokio::test]
    async fn test_every_unit_finishes_once() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let mut graph = standard_graph(load, remote.clone(), remote.clone(), store);
        graph.run_named("status").await.unwrap();
        graph.run_named("status").await.unwrap();

        for id in graph.order().to_vec() {
            assert_eq!(graph.status(id), UnitStatus::Complete);
        }
        assert_eq!(remote.requests().await.len(), 1);
        assert_eq!(remote.records("Account").await.len(), 1);
    }

    #[tokio::test]
    async fn test_second_run_reports_up_to_date() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let first = pipeline(CONFIG, load.clone(), remote.clone(), store.clone())
            .run()
            .await
            .unwrap();
        assert_eq!(first.status(EntityId(1)), Some(SyncStatus::Complete));

        let created = remote.records("Account").await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].get("OwnerId"), Some(&json!("005000000000001")));
        assert_eq!(created[0].get("Name"), Some(&json!("Ada Lovelace")));

        let second = pipeline(CONFIG, load.clone(), remote.clone(), store)
            .run()
            .await
            .unwrap();
        assert_eq!(second.status(EntityId(1)), Some(SyncStatus::Complete));
        assert_eq!(second.entries[0].message, UP_TO_DATE_MESSAGE);
        assert_eq!(remote.requests().await.len(), 1);
        assert_eq!(load.queue(EntityId(1)).map(|q| q.message).as_deref(), Some(UP_TO_DATE_MESSAGE));
    }

    #[tokio::test]
    async fn test_entity_error_wins_and_duplicates_follow_first_representative() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let load = Arc::new(
            InMemoryLoad::new(vec![
                customer(1, "Ada", "Lovelace", "ada@example.com"),
                customer(3, "Grace", "Hopper", ""),
            ])
            .with_duplicates(1, &[5, 7])
            .with_duplicates(3, &[7, 8])
            .with_scope(5, 2),
        );
        let store = Arc::new(RecordingStatusStore::new());

        let report = pipeline(CONFIG, load.clone(), remote.clone(), store.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(report.status(EntityId(1)), Some(SyncStatus::Complete));
        assert_eq!(report.status(EntityId(3)), Some(SyncStatus::Error));
        assert_eq!(report.status(EntityId(5)), Some(SyncStatus::Complete));
        assert_eq!(report.status(EntityId(7)), Some(SyncStatus::Complete));
        assert_eq!(report.status(EntityId(8)), Some(SyncStatus::Error));

        let error = load.queue(EntityId(3)).unwrap();
        assert_eq!(error.message, "Required field 'Email__c' has no value");
        assert_eq!(load.queue(EntityId(8)), Some(error));
        assert_eq!(load.queue(EntityId(5)), load.queue(EntityId(1)));

        let saved = store.saved().await;
        assert!(saved.contains(&SavedStatus {
            entity: EntityId(5),
            success: true,
            scope: Some(ScopeId(2)),
        }));
        assert!(saved.contains(&SavedStatus {
            entity: EntityId(8),
            success: false,
            scope: None,
        }));
        assert_eq!(saved.iter().filter(|s| s.entity == EntityId(7)).count(), 1);
    }

    #[tokio::test]
    async fn test_hidden_duplicate_is_explained() {
        let remote = Arc::new(
            InMemoryTransport::new()
                .with_description(account_description())
                .with_record(
                    "Account",
                    RemoteRecord::new()
                        .with("Id", "001X")
                        .with("Name", "Lovelace Holdings")
                        .with("Email__c", "ada@example.com"),
                )
                .with_unique_field("Account", "Email__c"),
        );
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let report = pipeline(CONFIG, load, remote, store).run().await.unwrap();

        let entry = &report.entries[0];
        assert_eq!(entry.status, SyncStatus::Error);
        assert!(entry.message.contains("may be archived"));
        assert!(entry.message.contains("duplicate value found: Email__c"));
    }

    #[tokio::test]
    async fn test_disabled_and_deferred_entities() {
        let remote = Arc::new(
            InMemoryTransport::new()
                .with_description(account_description())
                .with_deferred(2),
        );
        let load = Arc::new(InMemoryLoad::new(vec![
            customer(1, "Ada", "Lovelace", "ada@example.com").with("sync_disabled", 1),
            customer(2, "Grace", "Hopper", "grace@example.com"),
        ]));
        let store = Arc::new(RecordingStatusStore::new());

        let report = pipeline(CONFIG, load, remote.clone(), store.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(report.status(EntityId(1)), Some(SyncStatus::Skipped));
        assert_eq!(report.status(EntityId(2)), Some(SyncStatus::WaitingUpsert));
        let requests = remote.requests().await;
        assert!(!requests[0].payloads.contains(EntityId(1)));
        assert!(store.saved().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_the_run() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        remote
            .set_failure(Some(TransportError::Connection("connection refused".into())))
            .await;
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let mut pipeline = pipeline(CONFIG, load.clone(), remote, store.clone());
        let error = pipeline.run().await.unwrap_err();

        assert!(matches!(error, SyncError::Transport(TransportError::Connection(_))));
        let lookup = pipeline.graph().unit_id("lookup").unwrap();
        assert_eq!(pipeline.graph().status(lookup), UnitStatus::Error);
        assert!(load.queue(EntityId(1)).is_none());
        assert!(store.saved().await.is_empty());
    }

    fn grouped_batch() -> Arc<InMemoryLoad> {
        Arc::new(
            InMemoryLoad::new(vec![
                customer(1, "Ada", "Lovelace", "ada@example.com"),
                customer(2, "Grace", "Hopper", "grace@example.com"),
            ])
            .with_related(1, "order", Entity::new(101, "order").with("customer_group_id", 4))
            .with_related(2, "order", Entity::new(102, "order").with("customer_group_id", 9)),
        )
    }

    #[tokio::test]
    async fn test_customer_group_filter_keeps_others_out_of_every_stage() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let load = grouped_batch();
        let store = Arc::new(RecordingStatusStore::new());

        let yaml = format!("{}customer_groups: [4]\n", CONFIG);
        let report = pipeline(&yaml, load.clone(), remote.clone(), store.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(report.status(EntityId(1)), Some(SyncStatus::Complete));
        assert_eq!(report.status(EntityId(2)), None);
        assert_eq!(report.entries.len(), 1);

        let created = remote.records("Account").await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].get("Email__c"), Some(&json!("ada@example.com")));

        let requests = remote.requests().await;
        assert!(!requests[0].payloads.contains(EntityId(2)));
        assert!(remote.queries().await[0].fragment(EntityId(2)).is_none());
        assert!(load.queue(EntityId(2)).is_none());
        assert!(store.saved().await.iter().all(|s| s.entity != EntityId(2)));
    }

    #[tokio::test]
    async fn test_no_query_when_every_entity_is_vetoed() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let store = Arc::new(RecordingStatusStore::new());

        let yaml = format!("{}customer_groups: [7]\n", CONFIG);
        let report = pipeline(&yaml, grouped_batch(), remote.clone(), store)
            .run()
            .await
            .unwrap();

        assert!(report.entries.is_empty());
        assert!(remote.queries().await.is_empty());
        assert!(remote.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_skip_mapping_fields_selects_no_mapped_columns() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let yaml = format!("{}lookup:\n  skip_mapping_fields: true\n", CONFIG);
        pipeline(&yaml, load, remote.clone(), store).run().await.unwrap();

        let queries = remote.queries().await;
        assert_eq!(queries.len(), 1);
        assert!(!queries[0].has_column("Phone"));
        assert!(!queries[0].has_column("Email__c"));
    }

    const EMPTY_MAPPING: &str = r#"
object_type: Account
mapping:
  - { local_object: customer, local_attribute: fax, remote_field: Phone }
"#;

    #[tokio::test]
    async fn test_empty_payload_dropped_by_default() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let report = pipeline(EMPTY_MAPPING, load, remote.clone(), store)
            .run()
            .await
            .unwrap();

        assert_eq!(report.status(EntityId(1)), Some(SyncStatus::Skipped));
        assert!(remote.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_payload_sent_when_configured() {
        let remote = Arc::new(InMemoryTransport::new().with_description(account_description()));
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let yaml = format!("{}send_empty_payloads: true\n", EMPTY_MAPPING);
        let report = pipeline(&yaml, load, remote.clone(), store)
            .run()
            .await
            .unwrap();

        assert_eq!(report.status(EntityId(1)), Some(SyncStatus::Complete));
        let requests = remote.requests().await;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].payloads.get(EntityId(1)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_account_found_through_contact() {
        let contact: RemoteRecord = serde_json::from_value(json!({
            "Id": "003A",
            "Email": "Ada@Example.com",
            "AccountId": "001A",
            "Account": {
                "Id": "001A",
                "Name": "Ada Lovelace",
                "Phone": "555-0101",
                "Email__c": "ada@example.com"
            }
        }))
        .unwrap();
        let orphan: RemoteRecord = serde_json::from_value(json!({
            "Id": "003B",
            "Email": "ada@example.com",
            "AccountId": ""
        }))
        .unwrap();
        let remote = Arc::new(
            InMemoryTransport::new()
                .with_description(account_description())
                .with_records("Contact", vec![orphan, contact]),
        );
        let load = Arc::new(InMemoryLoad::new(vec![customer(1, "Ada", "Lovelace", "ada@example.com")]));
        let store = Arc::new(RecordingStatusStore::new());

        let yaml = format!(
            "{}\nlookup:\n  strategy: account_by_contact\n  external_id_field: Magento_ID__c\n  website_field: Website__c\n",
            CONFIG
        );
        let report = pipeline(&yaml, load, remote.clone(), store).run().await.unwrap();

        assert_eq!(report.status(EntityId(1)), Some(SyncStatus::Complete));
        assert_eq!(report.entries[0].message, UP_TO_DATE_MESSAGE);
        assert!(remote.requests().await.is_empty());

        let queries = remote.queries().await;
        assert_eq!(queries[0].from, "Contact");
        assert!(queries[0].has_column("Account.Phone"));
        assert!(queries[0].has_column("Account.Email__c"));
    }
}
