// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use chrono::{FixedOffset, Offset, Utc};
use serde_json::Value;
use std::sync::Arc;

use super::fields::{coerce_date, truncate};
use crate::engine::{RunContext, UnitRef, UnitResolver};
use crate::entity::{EntityId, EntityStore};
use crate::errors::{GraphError, SyncError};
use crate::observability::messages::upsert::{DateDropped, DropReason, FieldDropped, ValueTruncated};
use crate::observability::messages::StructuredLog;
use crate::traits::{Unit, UpsertInputView};
use crate::transport::record::scalar_text;
use crate::transport::{
    values_match, FieldValues, ObjectDescription, RemoteRecord, SchemaRegistry, ID_FIELD,
};
use crate::units::kinds;

pub const UP_TO_DATE_MESSAGE: &str = "Remote record is already up to date";

/// Write payload for one entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpsertPayload {
    pub fields: FieldValues,
    /// The matched remote record already holds every payload value.
    pub up_to_date: bool,
    pub message: String,
}

/// Turns mapped objects into schema-conformant payloads.
pub struct UpsertInputUnit {
    object_type: String,
    schema: Arc<SchemaRegistry>,
    timezone: FixedOffset,
    send_empty_payloads: bool,
    load: UnitRef,
    mapping: UnitRef,
    payloads: EntityStore<UpsertPayload>,
}

impl UpsertInputUnit {
    pub fn new(
        object_type: impl Into<String>,
        schema: Arc<SchemaRegistry>,
        load: &str,
        mapping: &str,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            schema,
            timezone: Utc.fix(),
            send_empty_payloads: false,
            load: UnitRef::named(load),
            mapping: UnitRef::named(mapping),
            payloads: EntityStore::new(),
        }
    }

    pub fn with_timezone(mut self, timezone: FixedOffset) -> Self {
        self.timezone = timezone;
        self
    }

    /// Keep entities whose payload ends up empty.
    pub fn send_empty_payloads(mut self, send: bool) -> Self {
        self.send_empty_payloads = send;
        self
    }
}

/// Apply the remote field rules to one mapped object.
///
/// Walks the described fields: the identifier and anything the object has no
/// value for are skipped, permissions are checked against the create or
/// update path, dates are coerced and text is truncated to length. Mapped
/// fields the description does not know are dropped.
pub fn build_fields(
    entity: EntityId,
    object: &FieldValues,
    existing: bool,
    description: &ObjectDescription,
    timezone: FixedOffset,
) -> FieldValues {
    let mut fields = FieldValues::new();

    for descriptor in &description.fields {
        if descriptor.name.eq_ignore_ascii_case(ID_FIELD) {
            continue;
        }
        let Some(value) = object
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&descriptor.name))
            .map(|(_, value)| value)
        else {
            continue;
        };

        if !existing && !descriptor.creatable {
            FieldDropped {
                entity,
                field: &descriptor.name,
                reason: DropReason::NotCreatable,
            }
            .log();
            continue;
        }
        if existing && !descriptor.updateable {
            FieldDropped {
                entity,
                field: &descriptor.name,
                reason: DropReason::NotUpdateable,
            }
            .log();
            continue;
        }

        let mut value = value.clone();
        if descriptor.field_type.is_temporal() {
            match coerce_date(&value, descriptor.field_type, timezone) {
                Ok(coerced) => value = coerced,
                Err(issue) => {
                    let raw = scalar_text(&value).unwrap_or_default();
                    DateDropped {
                        entity,
                        field: &descriptor.name,
                        value: &raw,
                        reason: issue.as_str(),
                    }
                    .log();
                    continue;
                }
            }
        }

        if descriptor.field_type.is_textual() {
            if let (Some(max_length), Value::String(text)) = (descriptor.length, &value) {
                if let Some(truncated) = truncate(text, max_length) {
                    ValueTruncated {
                        entity,
                        field: &descriptor.name,
                        original_length: text.chars().count(),
                        max_length,
                    }
                    .log();
                    value = Value::String(truncated);
                }
            }
        }

        fields.insert(descriptor.name.clone(), value);
    }

    for name in object.keys() {
        if !name.eq_ignore_ascii_case(ID_FIELD) && description.field(name).is_none() {
            FieldDropped {
                entity,
                field: name,
                reason: DropReason::UnknownField,
            }
            .log();
        }
    }

    fields
}

/// True when `record` already holds an equal value for every field.
pub fn is_up_to_date(fields: &FieldValues, record: &RemoteRecord) -> bool {
    !fields.is_empty()
        && fields
            .iter()
            .all(|(name, value)| values_match(value, record.get(name).unwrap_or(&Value::Null)))
}

#[async_trait]
impl Unit for UpsertInputUnit {
    fn kind(&self) -> &'static str {
        kinds::UPSERT_INPUT
    }

    fn bind(&mut self, resolver: &UnitResolver) -> Result<(), GraphError> {
        self.load.bind(resolver)?;
        self.mapping.bind(resolver)
    }

    async fn process(&mut self, ctx: &RunContext<'_>) -> Result<(), SyncError> {
        let description = self.schema.describe(&self.object_type).await?;

        let load = ctx.load(self.load.id()?)?;
        let mapping = ctx.mapping(self.mapping.id()?)?;
        let lookup = ctx.lookup(mapping.lookup_unit()?)?;

        let mut payloads = EntityStore::new();
        for entity in load.entities() {
            if ctx.skipped_by_dependencies(entity.id) {
                continue;
            }
            let Some(object) = mapping.object(entity.id) else {
                continue;
            };
            let record = lookup.record(entity.id);

            let mut fields =
                build_fields(entity.id, object, record.is_some(), &description, self.timezone);
            if fields.is_empty() && !self.send_empty_payloads {
                continue;
            }

            let up_to_date = record.is_some_and(|record| is_up_to_date(&fields, record));
            if let Some(id) = record.and_then(RemoteRecord::id) {
                fields.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            }
            payloads.insert(
                entity.id,
                UpsertPayload {
                    fields,
                    up_to_date,
                    message: if up_to_date {
                        UP_TO_DATE_MESSAGE.to_string()
                    } else {
                        String::new()
                    },
                },
            );
        }

        self.payloads = payloads;
        Ok(())
    }

    fn as_upsert_input(&self) -> Option<&dyn UpsertInputView> {
        Some(self)
    }
}

impl UpsertInputView for UpsertInputUnit {
    fn object_type(&self) -> &str {
        &self.object_type
    }

    fn payload(&self, entity: EntityId) -> Option<&UpsertPayload> {
        self.payloads.get(entity)
    }

    fn entities(&self) -> Vec<EntityId> {
        self.payloads.ids().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{FieldDescriptor, FieldType};
    use serde_json::json;

    fn account() -> ObjectDescription {
        ObjectDescription {
            name: "Account".into(),
            fields: vec![
                FieldDescriptor::new("Id", FieldType::Id).read_only(),
                FieldDescriptor::new("Name", FieldType::String).with_length(20),
                FieldDescriptor::new("AccountNumber", FieldType::String).update_only(),
                FieldDescriptor::new("Source__c", FieldType::Picklist).create_only(),
                FieldDescriptor::new("Birthday__c", FieldType::Date),
                FieldDescriptor::new("Phone", FieldType::Phone),
            ],
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn object(value: serde_json::Value) -> FieldValues {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_non_creatable_field_dropped_on_create_only() {
        let mapped = object(json!({ "Name": "Acme", "AccountNumber": "A-1" }));

        let create = build_fields(EntityId(1), &mapped, false, &account(), utc());
        assert!(!create.contains_key("AccountNumber"));

        let update = build_fields(EntityId(1), &mapped, true, &account(), utc());
        assert_eq!(update.get("AccountNumber"), Some(&json!("A-1")));
    }

    #[test]
    fn test_non_updateable_field_dropped_on_update() {
        let mapped = object(json!({ "Source__c": "Web" }));
        assert!(build_fields(EntityId(1), &mapped, true, &account(), utc()).is_empty());
        assert_eq!(
            build_fields(EntityId(1), &mapped, false, &account(), utc()).get("Source__c"),
            Some(&json!("Web"))
        );
    }

    #[test]
    fn test_identifier_unknown_and_missing_fields_skipped() {
        let mapped = object(json!({ "Id": "001", "Name": "Acme", "Legacy__c": "x" }));
        let fields = build_fields(EntityId(1), &mapped, true, &account(), utc());

        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("Name"), Some(&json!("Acme")));
    }

    #[test]
    fn test_text_truncated_and_dates_coerced() {
        let mapped = object(json!({
            "name": "Analytical Engines Incorporated",
            "Birthday__c": "1990-05-17 08:00:00",
            "Phone": "555-0100"
        }));
        let fields = build_fields(EntityId(1), &mapped, false, &account(), utc());

        assert_eq!(fields.get("Name"), Some(&json!("Analytical Engine...")));
        assert_eq!(fields.get("Birthday__c"), Some(&json!("1990-05-17")));
        assert_eq!(fields.get("Phone"), Some(&json!("555-0100")));
    }

    #[test]
    fn test_malformed_date_dropped_without_failing() {
        let mapped = object(json!({ "Name": "Acme", "Birthday__c": "0000-00-00" }));
        let fields = build_fields(EntityId(1), &mapped, false, &account(), utc());

        assert!(!fields.contains_key("Birthday__c"));
        assert!(fields.contains_key("Name"));
    }

    #[test]
    fn test_up_to_date_compares_every_field() {
        let record = RemoteRecord::new()
            .with("Id", "001")
            .with("Name", "ACME")
            .with("Phone", "555-0100");
        let same = object(json!({ "Name": "Acme", "Phone": "555-0100" }));
        let changed = object(json!({ "Name": "Acme", "Phone": "555-0199" }));

        assert!(is_up_to_date(&same, &record));
        assert!(!is_up_to_date(&changed, &record));
        assert!(!is_up_to_date(&FieldValues::new(), &record));
    }
}
