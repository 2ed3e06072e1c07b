// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gameplay notifications for the feedback collaborator (sound, toasts, UI).

use crate::models::{DistrictUnlock, RunSummary};
use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Notification {
    #[serde(rename_all = "camelCase")]
    DistrictUnlocked { id: String, name: String },
    #[serde(rename_all = "camelCase")]
    RunStarted { started_at: i64 },
    /// `summary` is `None` for a discarded false start.
    #[serde(rename_all = "camelCase")]
    RunStopped { summary: Option<RunSummary> },
}

impl Notification {
    pub fn name(&self) -> &'static str {
        match self {
            Notification::DistrictUnlocked { .. } => "districtUnlocked",
            Notification::RunStarted { .. } => "runStarted",
            Notification::RunStopped { .. } => "runStopped",
        }
    }
}

impl From<DistrictUnlock> for Notification {
    fn from(unlock: DistrictUnlock) -> Self {
        Notification::DistrictUnlocked {
            id: unlock.id,
            name: unlock.name,
        }
    }
}

/// Fan-out of notifications. Emitting never fails the engine.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
}

impl Default for Notifier {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }
}

impl Notifier {
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    pub fn emit(&self, notification: Notification) {
        // No subscribers is fine.
        let delivered = self.tx.send(notification).unwrap_or(0);
        tracing::trace!(delivered, "Notification emitted");
    }
}
