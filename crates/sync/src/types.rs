//! Payloads shared by the write queue and the remote client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use progress_core::{GameResults, StatsRecord};

/// Finished session as reported to `POST /progress/finish`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub user_id: String,
    #[serde(flatten)]
    pub results: GameResults,
}

/// A write the remote has not acknowledged yet.
///
/// Snapshot writes are whole-document replacements, so replaying one twice
/// is harmless. Session reports are history appends and are only produced
/// when session reporting is enabled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum PendingWrite {
    Snapshot(StatsRecord),
    Session(SessionReport),
}

/// Entry of the per-user FIFO write queue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQueueEntry {
    pub payload: PendingWrite,
    pub enqueued_at: DateTime<Utc>,
}

impl SyncQueueEntry {
    pub fn new(payload: PendingWrite, enqueued_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            enqueued_at,
        }
    }
}
