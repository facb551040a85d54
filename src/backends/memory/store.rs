// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::entity::{EntityId, ScopeId};
use crate::traits::StatusStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedStatus {
    pub entity: EntityId,
    pub success: bool,
    pub scope: Option<ScopeId>,
}

/// Status store that keeps every write in order.
#[derive(Debug, Default)]
pub struct RecordingStatusStore {
    saved: Mutex<Vec<SavedStatus>>,
    failing: AtomicBool,
}

impl RecordingStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following save fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn saved(&self) -> Vec<SavedStatus> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl StatusStore for RecordingStatusStore {
    async fn save_status(
        &self,
        entity: EntityId,
        success: bool,
        scope: Option<ScopeId>,
    ) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("status store unavailable");
        }
        self.saved.lock().await.push(SavedStatus {
            entity,
            success,
            scope,
        });
        Ok(())
    }
}
