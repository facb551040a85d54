// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Final per-entity status.
//!
//! Precedence, first match wins:
//!
//! 1. accumulated entity errors from any unit: `ERROR`
//! 2. no upsert outcome: `SKIPPED`
//! 3. outcome skipped: `COMPLETE` when the payload was already up to date, else `SKIPPED`
//! 4. outcome waiting: `WAITING_UPSERT`
//! 5. outcome success: `COMPLETE`
//! 6. otherwise `ERROR` with the remote messages
//!
//! Entities a direct dependency vetoes (load's customer group filter) get no
//! status at all.
//!
//! A second pass copies each representative's status onto its duplicates.
//! When two representatives list the same duplicate, the first in batch
//! order wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::kinds;
use crate::engine::{RunContext, UnitRef, UnitResolver};
use crate::entity::{EntityId, EntityStore, ScopeId};
use crate::errors::{GraphError, SyncError};
use crate::observability::messages::status::{
    DuplicatePropagated, StatusPersistFailed, StatusResolved,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{LoadProvider, StatusStore, StatusView, Unit, UpsertInputView};
use crate::transport::UpsertOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Error,
    Skipped,
    Complete,
    WaitingUpsert,
}

impl SyncStatus {
    /// Value written to the status store; only terminal outcomes persist.
    pub fn persisted_flag(self) -> Option<bool> {
        match self {
            SyncStatus::Complete => Some(true),
            SyncStatus::Error => Some(false),
            SyncStatus::Skipped | SyncStatus::WaitingUpsert => None,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncStatus::Error => "ERROR",
            SyncStatus::Skipped => "SKIPPED",
            SyncStatus::Complete => "COMPLETE",
            SyncStatus::WaitingUpsert => "WAITING_UPSERT",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: SyncStatus,
    #[serde(default)]
    pub message: String,
}

/// Queue record written back through the load provider.
pub type QueueUpdate = StatusRecord;

/// Derive a status from the evidence of one entity.
pub fn resolve_status(
    errors: &[String],
    outcome: Option<&UpsertOutcome>,
    input: &dyn UpsertInputView,
    entity: EntityId,
) -> StatusRecord {
    let input_message = || {
        input
            .payload(entity)
            .map(|payload| payload.message.clone())
            .unwrap_or_default()
    };

    if !errors.is_empty() {
        return StatusRecord {
            status: SyncStatus::Error,
            message: errors.join("\n"),
        };
    }
    let Some(outcome) = outcome else {
        return StatusRecord {
            status: SyncStatus::Skipped,
            message: String::new(),
        };
    };

    if outcome.skipped {
        let up_to_date = input.payload(entity).is_some_and(|p| p.up_to_date);
        StatusRecord {
            status: if up_to_date {
                SyncStatus::Complete
            } else {
                SyncStatus::Skipped
            },
            message: input_message(),
        }
    } else if outcome.waiting {
        StatusRecord {
            status: SyncStatus::WaitingUpsert,
            message: input_message(),
        }
    } else if outcome.success {
        StatusRecord {
            status: SyncStatus::Complete,
            message: input_message(),
        }
    } else {
        StatusRecord {
            status: SyncStatus::Error,
            message: outcome.message().unwrap_or_default(),
        }
    }
}

pub struct StatusUnit {
    store: Option<Arc<dyn StatusStore>>,
    load: UnitRef,
    upsert_output: UnitRef,
    statuses: EntityStore<StatusRecord>,
}

impl StatusUnit {
    pub fn new(load: &str, upsert_output: &str) -> Self {
        Self {
            store: None,
            load: UnitRef::named(load),
            upsert_output: UnitRef::named(upsert_output),
            statuses: EntityStore::new(),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn StatusStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Best effort: failures are logged and the run continues.
    async fn persist(
        &self,
        provider: &dyn LoadProvider,
        entity: EntityId,
        scope: Option<ScopeId>,
        record: &StatusRecord,
    ) {
        if let (Some(store), Some(success)) = (&self.store, record.status.persisted_flag()) {
            if let Err(error) = store.save_status(entity, success, scope).await {
                StatusPersistFailed {
                    entity,
                    sink: "status store",
                    error: &error,
                }
                .log();
            }
        }
        if let Err(error) = provider.update_queue(entity, record).await {
            StatusPersistFailed {
                entity,
                sink: "queue",
                error: &error,
            }
            .log();
        }
    }
}

#[async_trait]
impl Unit for StatusUnit {
    fn kind(&self) -> &'static str {
        kinds::STATUS
    }

    fn bind(&mut self, resolver: &UnitResolver) -> Result<(), GraphError> {
        self.load.bind(resolver)?;
        self.upsert_output.bind(resolver)
    }

    async fn process(&mut self, ctx: &RunContext<'_>) -> Result<(), SyncError> {
        let load = ctx.load(self.load.id()?)?;
        let output = ctx.upsert_output(self.upsert_output.id()?)?;
        let input = ctx.upsert_input(output.input_unit()?)?;
        let provider = load.provider();

        let mut statuses = EntityStore::new();
        for entity in load.entities() {
            if ctx.skipped_by_dependencies(entity.id) {
                continue;
            }
            let errors = ctx.entity_errors(entity.id);
            let record = resolve_status(&errors, output.outcome(entity.id), input, entity.id);
            StatusResolved {
                entity: entity.id,
                status: record.status,
                message: &record.message,
            }
            .log();
            self.persist(provider.as_ref(), entity.id, load.scope(entity.id), &record)
                .await;
            statuses.insert(entity.id, record);
        }

        let mut claimed = HashSet::new();
        for entity in load.entities() {
            let Some(record) = statuses.get(entity.id).cloned() else {
                continue;
            };
            for duplicate in load.duplicates(entity.id) {
                if duplicate == entity.id || !claimed.insert(duplicate) {
                    continue;
                }
                DuplicatePropagated {
                    entity: entity.id,
                    duplicate,
                    status: record.status,
                }
                .log();
                self.persist(provider.as_ref(), duplicate, load.scope(duplicate), &record)
                    .await;
                statuses.insert(duplicate, record.clone());
            }
        }

        self.statuses = statuses;
        Ok(())
    }

    fn as_status(&self) -> Option<&dyn StatusView> {
        Some(self)
    }
}

impl StatusView for StatusUnit {
    fn status(&self, entity: EntityId) -> Option<&StatusRecord> {
        self.statuses.get(entity)
    }

    fn statuses(&self) -> Vec<(EntityId, &StatusRecord)> {
        self.statuses.iter().collect()
    }
}
