// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::engine::{RunContext, UnitId, UnitRef, UnitResolver};
use crate::entity::{EntityId, EntityStore};
use crate::errors::{GraphError, SyncError};
use crate::observability::messages::upsert::{UpsertCompleted, UpsertSkipped};
use crate::observability::messages::StructuredLog;
use crate::traits::{Transport, Unit, UpsertOutputView};
use crate::transport::{RemoteError, UpsertOutcome, UpsertRequest, DUPLICATE_VALUE};
use crate::units::kinds;

/// Sends every payload that is not already up to date in one upsert call.
pub struct UpsertOutputUnit {
    transport: Arc<dyn Transport>,
    input: UnitRef,
    lookup: UnitRef,
    outcomes: EntityStore<UpsertOutcome>,
}

impl UpsertOutputUnit {
    pub fn new(transport: Arc<dyn Transport>, input: &str, lookup: &str) -> Self {
        Self {
            transport,
            input: UnitRef::named(input),
            lookup: UnitRef::named(lookup),
            outcomes: EntityStore::new(),
        }
    }
}

/// A unique-value conflict with no matched record means the conflicting
/// remote record exists but the lookup could not see it.
fn explain_hidden_duplicate(object_type: &str, outcome: &mut UpsertOutcome) {
    for error in outcome.errors.iter_mut().filter(|e| e.code == DUPLICATE_VALUE) {
        *error = RemoteError::new(
            DUPLICATE_VALUE,
            format!(
                "Item cannot be synced: a matching {} record already exists in the remote \
                 system but could not be located, it may be archived ({})",
                object_type, error.message
            ),
        );
    }
}

#[async_trait]
impl Unit for UpsertOutputUnit {
    fn kind(&self) -> &'static str {
        kinds::UPSERT_OUTPUT
    }

    fn bind(&mut self, resolver: &UnitResolver) -> Result<(), GraphError> {
        self.input.bind(resolver)?;
        self.lookup.bind(resolver)
    }

    async fn process(&mut self, ctx: &RunContext<'_>) -> Result<(), SyncError> {
        let input = ctx.upsert_input(self.input.id()?)?;
        let lookup = ctx.lookup(self.lookup.id()?)?;
        let object_type = input.object_type();

        let mut outcomes = EntityStore::new();
        let mut request = UpsertRequest::new(object_type);
        for entity in input.entities() {
            let Some(payload) = input.payload(entity) else {
                continue;
            };
            if payload.up_to_date {
                outcomes.insert(entity, UpsertOutcome::skipped());
            } else {
                request.payloads.insert(entity, payload.fields.clone());
            }
        }
        let up_to_date = outcomes.len();

        if request.count() == 0 {
            UpsertSkipped { object_type }.log();
            self.outcomes = outcomes;
            return Ok(());
        }

        let response = self.transport.upsert(&request).await?;
        let mut succeeded = 0;
        for (entity, outcome) in response.iter() {
            if !request.payloads.contains(entity) {
                continue;
            }
            let mut outcome = outcome.clone();
            if !outcome.success
                && outcome.has_error_code(DUPLICATE_VALUE)
                && lookup.record(entity).is_none()
            {
                explain_hidden_duplicate(object_type, &mut outcome);
            }
            if outcome.success {
                succeeded += 1;
            }
            outcomes.insert(entity, outcome);
        }

        UpsertCompleted {
            object_type,
            sent: request.count(),
            succeeded,
            up_to_date,
        }
        .log();
        self.outcomes = outcomes;
        Ok(())
    }

    fn as_upsert_output(&self) -> Option<&dyn UpsertOutputView> {
        Some(self)
    }
}

impl UpsertOutputView for UpsertOutputUnit {
    fn input_unit(&self) -> Result<UnitId, GraphError> {
        self.input.id()
    }

    fn outcome(&self, entity: EntityId) -> Option<&UpsertOutcome> {
        self.outcomes.get(entity)
    }
}
