//! Events and status published by the scheduler.

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use progress_core::LevelRewards;

/// Last known reachability of the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    /// Nothing has been probed yet.
    #[default]
    Unknown,
    Online,
    Offline,
}

impl Connectivity {
    pub fn is_online(self) -> bool {
        self == Self::Online
    }
}

/// What the background worker is doing right now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    Probing,
    Syncing,
}

/// Observable scheduler state, published on a watch channel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    pub connectivity: Connectivity,
    pub pending_writes: usize,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Outcome of one sync pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub connectivity: Connectivity,
    /// Queue entries acknowledged by the remote during this pass.
    pub drained: usize,
    /// Entries still queued afterwards.
    pub remaining: usize,
    /// Whether a fresh server record was fetched and merged.
    pub fetched: bool,
    /// The server had no record yet and the local snapshot was uploaded
    /// instead. Counts as fresh for reads; `fetched` stays false.
    pub seeded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    /// A session crossed at least one level boundary.
    LevelUp {
        user_id: String,
        previous_level: u32,
        new_level: u32,
        rewards: LevelRewards,
    },
    /// A write could not be delivered and waits in the queue.
    WriteQueued { user_id: String, pending: usize },
    /// The remote acknowledged a write.
    WritePushed { user_id: String },
    QueueDrained {
        user_id: String,
        drained: usize,
        remaining: usize,
    },
    /// The server record was fetched and merged into the local snapshot.
    Refreshed { user_id: String, xp: u64, level: u32 },
    ConnectivityChanged { connectivity: Connectivity },
}

/// Best-effort publish: no subscribers is normal.
pub(crate) fn publish(tx: &broadcast::Sender<SyncEvent>, event: SyncEvent) {
    if tx.send(event).is_err() {
        tracing::trace!("No subscribers for sync event");
    }
}
